//! Settings loading helpers for the binaries.
//!
//! Framework flags (listed in [`SETTINGS_CLI_FLAGS`]) are peeled off the
//! front of the argument list and handed to the settings loader. The first
//! token that is not a framework flag starts the command line forwarded to
//! the command router.

use std::ffi::{OsStr, OsString};

use kore_config::{SETTINGS_CLI_FLAGS, Settings};
use ortho_config::OrthoConfig;

use crate::AppError;

pub(crate) trait SettingsLoader {
    /// Loads settings from framework flags, program name first.
    ///
    /// # Flag Ordering
    ///
    /// Framework flags must appear before the command token. Flags after it
    /// belong to the command.
    fn load(&self, args: &[OsString]) -> Result<Settings, AppError>;
}

/// Loads settings from flags, `KORE_*` variables and `.kore.toml`.
pub(crate) struct EnvSettingsLoader;

impl SettingsLoader for EnvSettingsLoader {
    fn load(&self, args: &[OsString]) -> Result<Settings, AppError> {
        Settings::load_from_iter(args.iter().cloned()).map_err(AppError::LoadSettings)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }
    let (flag, has_inline_value) = text
        .split_once('=')
        .map_or((text.as_ref(), false), |(flag, _)| (flag, true));
    if SETTINGS_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !has_inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SettingsArgumentSplit {
    pub(crate) settings_arguments: Vec<OsString>,
    pub(crate) command_start: usize,
}

pub(crate) fn split_settings_arguments(args: &[OsString]) -> SettingsArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return SettingsArgumentSplit {
            settings_arguments: Vec::new(),
            command_start: 0,
        };
    };

    let mut settings_arguments = vec![program.clone()];
    let mut command_start = 1usize;
    let mut pending_value = false;
    for argument in rest {
        if pending_value {
            pending_value = false;
        } else {
            match classify_flag(argument) {
                FlagAction::Include { needs_value } => pending_value = needs_value,
                FlagAction::Stop => break,
            }
        }
        settings_arguments.push(argument.clone());
        command_start += 1;
    }

    SettingsArgumentSplit {
        settings_arguments,
        command_start,
    }
}

/// Program name followed by everything from the command token on.
pub(crate) fn command_arguments(
    args: &[OsString],
    split: &SettingsArgumentSplit,
) -> Result<Vec<String>, AppError> {
    let program = args.first().into_iter();
    let command = args.get(split.command_start..).unwrap_or_default();
    program
        .chain(command)
        .map(|argument| {
            argument
                .clone()
                .into_string()
                .map_err(|raw| AppError::NonUtf8Argument(raw.to_string_lossy().into_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case("--log-filter=debug", FlagAction::Include { needs_value: false })]
    #[case("--app-dir", FlagAction::Include { needs_value: true })]
    #[case("--fail=1", FlagAction::Stop)]
    #[case("ping", FlagAction::Stop)]
    fn classifies_framework_flags(#[case] argument: &str, #[case] expected: FlagAction) {
        assert_eq!(classify_flag(OsStr::new(argument)), expected);
    }

    #[test]
    fn framework_flags_stop_at_the_command_token() {
        let args = os_args(&["kore", "--app-dir", "/srv/app", "--env=prod", "ping", "--app-dir=x"]);
        let split = split_settings_arguments(&args);
        assert_eq!(
            split.settings_arguments,
            os_args(&["kore", "--app-dir", "/srv/app", "--env=prod"])
        );
        assert_eq!(split.command_start, 4);
        let command = command_arguments(&args, &split).expect("utf8");
        assert_eq!(command, ["kore", "ping", "--app-dir=x"]);
    }

    #[test]
    fn missing_command_leaves_only_the_program_name() {
        let args = os_args(&["kore", "--log-level=info"]);
        let split = split_settings_arguments(&args);
        assert_eq!(split.command_start, 2);
        let command = command_arguments(&args, &split).expect("utf8");
        assert_eq!(command, ["kore"]);
    }

    #[test]
    fn empty_arguments_split_to_nothing() {
        let split = split_settings_arguments(&[]);
        assert!(split.settings_arguments.is_empty());
        assert!(command_arguments(&[], &split).expect("utf8").is_empty());
    }
}
