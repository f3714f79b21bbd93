use chrono_tz::Tz;
use nova_core::error::ErrorBody;
use nova_sync::SyncError;
use serde::Serialize;

/// Exit codes: 0=success, 1=rejected input or agent refusal,
///             3=backend unreachable or failing, 4=usage error
pub const EXIT_OK: i32 = 0;
pub const EXIT_REJECTED: i32 = 1;
pub const EXIT_CONNECTION: i32 = 3;
pub const EXIT_USAGE: i32 = 4;

pub fn parse_timezone(raw: &str) -> Result<Tz, String> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|_| format!("unknown IANA timezone '{raw}'"))
}

pub fn exit_code(err: &SyncError) -> i32 {
    match err {
        SyncError::RequestFailed { .. } | SyncError::MalformedResponse { .. } => EXIT_CONNECTION,
        SyncError::Config(_) => EXIT_USAGE,
        SyncError::Validation(_)
        | SyncError::AgentRejected { .. }
        | SyncError::UnknownUser(_)
        | SyncError::SessionClosed => EXIT_REJECTED,
    }
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{text}");
            EXIT_OK
        }
        Err(e) => {
            print_body(&ErrorBody::new("cli_error", format!("failed to encode output: {e}")));
            EXIT_USAGE
        }
    }
}

fn print_body(body: &ErrorBody) {
    let text = serde_json::to_string_pretty(body)
        .unwrap_or_else(|_| format!("{{\"error\":\"{}\"}}", body.error));
    eprintln!("{text}");
}

/// Prints the structured error envelope on stderr and returns its exit code.
pub fn report_error(err: &SyncError) -> i32 {
    print_body(&err.to_body());
    exit_code(err)
}

pub fn exit_usage(message: &str, docs_hint: Option<&str>) -> ! {
    let mut body = ErrorBody::new("cli_error", message);
    if let Some(hint) = docs_hint {
        body = body.with_docs_hint(hint);
    }
    print_body(&body);
    std::process::exit(EXIT_USAGE);
}

#[cfg(test)]
mod tests {
    use nova_core::agents::AgentKind;
    use nova_core::error::ValidationError;

    use super::*;

    #[test]
    fn errors_map_to_documented_exit_codes() {
        let validation = SyncError::from(ValidationError::EmptyInput { field: "mood" });
        assert_eq!(exit_code(&validation), EXIT_REJECTED);
        let rejected = SyncError::AgentRejected {
            kind: AgentKind::Cgm,
            message: "no".into(),
        };
        assert_eq!(exit_code(&rejected), EXIT_REJECTED);
        let down = SyncError::RequestFailed {
            endpoint: "/mood".into(),
            status: None,
            message: "refused".into(),
        };
        assert_eq!(exit_code(&down), EXIT_CONNECTION);
        assert_eq!(exit_code(&SyncError::Config("bad url".into())), EXIT_USAGE);
    }

    #[test]
    fn timezones_are_iana_names() {
        assert_eq!(parse_timezone(" America/New_York ").unwrap(), chrono_tz::America::New_York);
        assert!(parse_timezone("EST5EDT-ish").is_err());
    }
}
