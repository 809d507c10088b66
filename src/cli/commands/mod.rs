pub mod account;
pub mod api;
pub mod browse;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("hogar")
        .about("Real-estate marketplace client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true);

    let command = api::with_args(command);
    let command = account::with_subcommands(command);
    let command = browse::with_subcommands(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use account::{ARG_CODE, ARG_EMAIL, ARG_ROLE, CMD_REGISTER, CMD_VERIFY};
    use api::{ARG_API_URL, ARG_STATE_DIR, ARG_TIMEOUT};
    use logging::{ARG_LOG_JSON, ARG_VERBOSITY};

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "hogar");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Real-estate marketplace client".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_subcommand_required() {
        let result = new().try_get_matches_from(vec!["hogar", "--api-url", "http://localhost"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_api_args() {
        temp_env::with_vars(
            [
                ("HOGAR_API_URL", None::<&str>),
                ("HOGAR_STATE_DIR", None),
                ("HOGAR_TIMEOUT", None),
            ],
            || {
                let matches = new().get_matches_from(vec![
                    "hogar",
                    "--api-url",
                    "https://api.hogar.app",
                    "--state-dir",
                    "/tmp/hogar",
                    "whoami",
                ]);

                assert_eq!(
                    matches.get_one::<String>(ARG_API_URL).cloned(),
                    Some("https://api.hogar.app".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>(ARG_STATE_DIR).cloned(),
                    Some("/tmp/hogar".to_string())
                );
                assert_eq!(matches.get_one::<u64>(ARG_TIMEOUT).copied(), Some(10));
                assert!(!matches.get_flag(ARG_LOG_JSON));
                assert_eq!(matches.subcommand_name(), Some("whoami"));
            },
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("HOGAR_API_URL", Some("http://localhost:3000")),
                ("HOGAR_TIMEOUT", Some("30")),
                ("HOGAR_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["hogar", "properties"]);
                assert_eq!(
                    matches.get_one::<String>(ARG_API_URL).cloned(),
                    Some("http://localhost:3000".to_string())
                );
                assert_eq!(matches.get_one::<u64>(ARG_TIMEOUT).copied(), Some(30));
                assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        temp_env::with_var("HOGAR_TIMEOUT", None::<&str>, || {
            let result =
                new().try_get_matches_from(vec!["hogar", "--timeout", "0", "properties"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("HOGAR_LOG_LEVEL", Some(level))], || {
                let matches = new().get_matches_from(vec!["hogar", "whoami"]);
                assert_eq!(
                    matches.get_one::<u8>(ARG_VERBOSITY).copied(),
                    Some(u8::try_from(index).unwrap())
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for index in 0..5_u8 {
            temp_env::with_vars([("HOGAR_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["hogar".to_string(), "whoami".to_string()];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(usize::from(index))));
                }

                let matches = new().get_matches_from(args);
                assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(index));
            });
        }
    }

    #[test]
    fn test_register_defaults_to_buyer() {
        temp_env::with_vars([("HOGAR_PASSWORD", Some("correct-horse"))], || {
            let matches = new().get_matches_from(vec![
                "hogar",
                CMD_REGISTER,
                "--name",
                "Ana Pérez",
                "--email",
                "ana@hogar.app",
            ]);
            let (name, sub) = matches.subcommand().unwrap();
            assert_eq!(name, CMD_REGISTER);
            assert_eq!(
                sub.get_one::<String>(ARG_ROLE).cloned(),
                Some("buyer".to_string())
            );
        });
    }

    #[test]
    fn test_verify_email_is_optional() {
        temp_env::with_vars([("HOGAR_EMAIL", None::<&str>)], || {
            let matches = new().get_matches_from(vec!["hogar", CMD_VERIFY, "123456"]);
            let (_, sub) = matches.subcommand().unwrap();
            assert_eq!(
                sub.get_one::<String>(ARG_CODE).cloned(),
                Some("123456".to_string())
            );
            assert_eq!(sub.get_one::<String>(ARG_EMAIL), None);
        });
    }
}
