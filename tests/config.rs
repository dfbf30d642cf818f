//! The shipped sample configuration stays loadable.

use rss_courier::models::{Config, Destination, FailurePolicy, LinkStyle};

const SAMPLE: &str = include_str!("../data/config.toml");

#[test]
fn sample_config_parses() {
    let config = Config::parse(SAMPLE).unwrap();

    assert_eq!(config.expiration_days, 3);
    assert_eq!(config.failure_policy, FailurePolicy::Abort);
    assert_eq!(config.genres.len(), 2);
    assert!(matches!(config.genres[0].destination, Destination::Forum { .. }));
    assert_eq!(config.genres[0].link_style(), LinkStyle::Markdown);
    assert_eq!(config.genres[1].link_style(), LinkStyle::Angle);
}

#[test]
fn sample_config_needs_a_token_for_forums() {
    let mut config = Config::parse(SAMPLE).unwrap();
    assert!(config.validate().is_err());

    config.discord.bot_token = Some("token".into());
    config.validate().unwrap();
}
