//! Snapshot tests for the assistant adapter

#[cfg(test)]
mod snapshot_tests {
    use crate::AssistantConfig;
    use insta::assert_yaml_snapshot;

    #[test]
    fn test_config_snapshot() {
        let config = AssistantConfig {
            api_key: "test_api_key_redacted".to_string(),
            vector_store_id: "vs_test".to_string(),
            assistant_id: "asst_test".to_string(),
            api_url: "https://api.openai.com/v1".to_string(),
            poll_interval_secs: 2,
            poll_deadline_secs: 300,
        };

        assert_yaml_snapshot!(config, @r###"
        ---
        api_key: test_api_key_redacted
        vector_store_id: vs_test
        assistant_id: asst_test
        api_url: "https://api.openai.com/v1"
        poll_interval_secs: 2
        poll_deadline_secs: 300
        "###);
    }

    #[test]
    fn test_explicit_config_defaults() {
        let config = AssistantConfig::new("key", "vs_1", "asst_1");

        assert_eq!(config.api_url, "https://api.openai.com/v1");
        assert_eq!(config.poll_interval().as_secs(), 2);
        assert_eq!(config.poll_deadline().as_secs(), 300);
    }
}
