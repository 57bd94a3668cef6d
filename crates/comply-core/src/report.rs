//! Human-readable result blocks.

use crate::executor::TestCase;
use crate::fixtures::CaseSpec;
use crate::scheduler::RunSummary;

/// Separator printed after every case.
pub const SEPARATOR: &str = "=======";

/// ANSI color codes for terminal output.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const GREEN: &str = "\x1b[32m";
    pub const RED: &str = "\x1b[31m";
}

/// `<METHOD> <route>` plus fixture query parameters.
///
/// Parameters from `queryParams` are appended after any query the route
/// already carries.
pub fn display_route(spec: &CaseSpec) -> String {
    let mut line = format!("{} {}", spec.method, spec.route);
    if !spec.query_params.is_empty() {
        line.push(if spec.route.contains('?') { '&' } else { '?' });
        let pairs: Vec<String> = spec
            .query_params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        line.push_str(&pairs.join("&"));
    }
    line
}

/// Formats one terminal case as a block ending in [`SEPARATOR`].
pub fn format_case(case: &TestCase, use_colors: bool) -> String {
    let paint = |color: &str, text: &str| {
        if use_colors {
            format!("{color}{text}{}", colors::RESET)
        } else {
            text.to_string()
        }
    };

    let route = display_route(&case.spec);
    let mut out = if case.skipped {
        format!("{} {}\n", paint(colors::DIM, &route), paint(colors::DIM, "Skipped"))
    } else if case.result.success {
        format!("{} {}\n", paint(colors::BOLD, &route), paint(colors::GREEN, "✅"))
    } else {
        let mut block = format!("{} {}\n", paint(colors::BOLD, &route), paint(colors::RED, "❌"));
        if let Some(error) = &case.result.error {
            for line in error.to_string().lines() {
                block.push_str("  ");
                block.push_str(line);
                block.push('\n');
            }
        }
        block
    };
    out.push_str(SEPARATOR);
    out
}

/// One-line run summary.
pub fn format_summary(summary: &RunSummary, use_colors: bool) -> String {
    let text = format!("Results: {summary}");
    if !use_colors {
        return text;
    }
    let color = if summary.has_failures() {
        colors::RED
    } else {
        colors::GREEN
    };
    format!("{}{color}{text}{}", colors::BOLD, colors::RESET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{CaseError, CaseResult};
    use crate::verify::Mismatch;

    #[test]
    fn test_display_route_appends_params() {
        let spec = CaseSpec::get("/eth/v1/beacon/headers")
            .query("slot", "1")
            .query("parent_root", "0xab");
        assert_eq!(
            display_route(&spec),
            "GET /eth/v1/beacon/headers?parent_root=0xab&slot=1"
        );

        let spec = CaseSpec::get("/eth/v1/beacon/headers?slot=1").query("parent_root", "0xab");
        assert_eq!(
            display_route(&spec),
            "GET /eth/v1/beacon/headers?slot=1&parent_root=0xab"
        );
    }

    #[test]
    fn test_format_success_and_skip() {
        let mut case = TestCase::new(CaseSpec::get("/eth/v1/node/version"));
        case.result = CaseResult::succeeded();
        assert_eq!(format_case(&case, false), "GET /eth/v1/node/version ✅\n=======");

        let mut case = TestCase::new(CaseSpec::get("/eth/v1/node/version"));
        case.skipped = true;
        assert_eq!(format_case(&case, false), "GET /eth/v1/node/version Skipped\n=======");
    }

    #[test]
    fn test_format_failure_includes_error() {
        let mut case = TestCase::new(CaseSpec::get("/beacon/genesis"));
        case.result = CaseResult::failed(CaseError::Expectation(Mismatch::Status {
            expected: 200,
            actual: 500,
        }));
        let text = format_case(&case, false);
        assert!(text.starts_with("GET /beacon/genesis ❌\n"));
        assert!(text.contains("  Expected status code: 200"));
        assert!(text.contains("  Received status code: 500"));
        assert!(text.ends_with(SEPARATOR));
    }

    #[test]
    fn test_colors_only_when_enabled() {
        let mut case = TestCase::new(CaseSpec::get("/eth/v1/node/version"));
        case.result = CaseResult::succeeded();
        assert!(format_case(&case, true).contains("\x1b[32m"));
        assert!(!format_case(&case, false).contains('\x1b'));

        let summary = RunSummary {
            passed: 2,
            failed: 0,
            skipped: 1,
        };
        assert_eq!(
            format_summary(&summary, false),
            "Results: 2 passed, 0 failed, 1 skipped"
        );
    }
}
