use crate::commands::Out;
use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData;
use serde::Serialize;
use std::fmt::Debug;
use tracing::error;

/// The message first, then the rendered table (if the command drew one), then the structured
/// data as JSON. Agents read the table more reliably than they total the JSON themselves.
pub(super) fn to_content<T>(out: Out<T>) -> Vec<Content>
where
    T: Debug + Clone + Serialize,
{
    let mut content = vec![Content::text(out.message())];
    if let Some(display) = out.display() {
        content.push(Content::text(display));
    }
    if let Some(object) = out.structure() {
        match Content::json(object) {
            Ok(json) => content.push(json),
            Err(e) => error!("Unable to serialize {} as JSON: {e}", std::any::type_name::<T>()),
        };
    }
    content
}

/// Errors become a tool error (not a protocol error) so the agent sees the message, the kind of
/// failure and what the user can do about it.
pub(super) fn tool_result<T>(result: crate::Result<Out<T>>) -> Result<CallToolResult, ErrorData>
where
    T: Debug + Clone + Serialize,
{
    Ok(match result {
        Ok(out) => CallToolResult::success(to_content(out)),
        Err(e) => CallToolResult::error(vec![Content::text(format!(
            "{} error: {e:#}\n\n{}",
            e.error_type(),
            e.remedy()
        ))]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorType};

    #[test]
    fn test_to_content_order() {
        let out = Out::new("Found 1 goals", vec!["Groceries".to_string()]).with_display("TABLE");
        let content = serde_json::to_string(&to_content(out)).unwrap();
        let message = content.find("Found 1 goals").unwrap();
        let table = content.find("TABLE").unwrap();
        let json = content.find("Groceries").unwrap();
        assert!(message < table && table < json);
    }

    #[test]
    fn test_tool_result_error_has_remedy() {
        let result: crate::Result<Out<()>> = Err(Error::msg(
            ErrorType::Request,
            "There is no goal for the category 'Travel'",
        ));
        let result = tool_result(result).unwrap();
        assert_eq!(result.is_error, Some(true));
        let text = serde_json::to_string(&result.content).unwrap();
        assert!(text.contains("request error: There is no goal"));
        assert!(text.contains(ErrorType::Request.remedy()));
    }
}
