use std::process::ExitStatus;

use bridge_protocol::{AskResponse, ExitDetail};

/// Everything observed about one finished tool run.
#[derive(Debug)]
pub(crate) struct RunOutput {
    pub(crate) status: ExitStatus,
    pub(crate) stdout: Vec<u8>,
    pub(crate) stderr: Vec<u8>,
    pub(crate) timed_out: bool,
    pub(crate) escalated: bool,
}

impl RunOutput {
    pub(crate) fn into_response(self, detailed: bool) -> AskResponse {
        let detail = exit_detail(&self.status);
        let response = AskResponse::new(
            self.status.code(),
            decode_output(self.stdout),
            decode_output(self.stderr),
        );
        if detailed {
            response.with_detail(detail, self.timed_out, self.escalated)
        } else {
            response
        }
    }
}

pub(crate) fn exit_detail(status: &ExitStatus) -> ExitDetail {
    if let Some(code) = status.code() {
        return ExitDetail::Exited { code };
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ExitDetail::Signaled {
                signal: system_utils::process::signal_name(signal),
            };
        }
    }
    ExitDetail::Unknown
}

fn decode_output(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    const SIGTERM_RAW: i32 = 15;

    fn output(raw_status: i32) -> RunOutput {
        RunOutput {
            status: ExitStatus::from_raw(raw_status),
            stdout: "héllo".as_bytes().to_vec(),
            stderr: Vec::new(),
            timed_out: false,
            escalated: false,
        }
    }

    #[test]
    fn normal_exit_reports_code() {
        // Wait status encodes the exit code in the second byte.
        let response = output(3 << 8).into_response(false);
        assert_eq!(response.code, 3);
        assert_eq!(response.stdout, "héllo");
        assert!(response.exit.is_none());
        assert!(response.timed_out.is_none());
        assert!(response.force_killed.is_none());
    }

    #[test]
    fn signal_exit_collapses_to_sentinel() {
        let response = output(SIGTERM_RAW).into_response(false);
        assert_eq!(response.code, -1);
    }

    #[test]
    fn detailed_mode_names_the_signal() {
        let mut run = output(SIGTERM_RAW);
        run.timed_out = true;
        let response = run.into_response(true);
        assert_eq!(
            response.exit,
            Some(ExitDetail::Signaled {
                signal: "SIGTERM".to_string()
            })
        );
        assert_eq!(response.timed_out, Some(true));
        assert_eq!(response.force_killed, Some(false));
    }

    #[test]
    fn invalid_utf8_is_replaced_not_dropped() {
        let text = decode_output(vec![b'o', b'k', 0xff]);
        assert_eq!(text, "ok\u{fffd}");
    }
}
