use transitbuddy_core::config::AppConfig;

pub fn default_suggested_prompts() -> Vec<String> {
    vec![
        "bus stops near me".into(),
        "how to get from home to orchard".into(),
        "Bus arrivals at 83139".into(),
    ]
}

pub fn default_app_config() -> AppConfig {
    AppConfig {
        suggested_prompts: default_suggested_prompts(),
        ..AppConfig::default()
    }
}
