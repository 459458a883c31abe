pub(crate) const PRINT_FLAG: &str = "-p";
pub(crate) const OUTPUT_FORMAT_FLAG: &str = "--output-format";
pub(crate) const OUTPUT_FORMAT_TEXT: &str = "text";
pub(crate) const STRICT_MCP_FLAG: &str = "--strict-mcp-config";
pub(crate) const SKIP_PERMISSIONS_FLAG: &str = "--dangerously-skip-permissions";
pub(crate) const MODEL_FLAG: &str = "--model";

/// Arguments passed to the tool after the configured command prefix.
///
/// The tool refuses the permission bypass when run as root, so it is only
/// added for unprivileged processes. The prompt is always the last token.
pub(crate) fn build_invocation_args(
    prompt: &str,
    model: Option<&str>,
    privileged: bool,
) -> Vec<String> {
    let mut args = vec![
        PRINT_FLAG.to_string(),
        OUTPUT_FORMAT_FLAG.to_string(),
        OUTPUT_FORMAT_TEXT.to_string(),
        STRICT_MCP_FLAG.to_string(),
    ];
    if !privileged {
        args.push(SKIP_PERMISSIONS_FLAG.to_string());
    }
    if let Some(model) = model {
        args.push(MODEL_FLAG.to_string());
        args.push(model.to_string());
    }
    args.push(prompt.to_string());
    args
}
