// Response envelope mapping
//
// Turns whatever came back from `/ins` into exactly one `ResponseView`
// per requested command, in request order:
//
// - non-200 status   -> one failure per command, body not parsed
// - JSON array       -> element per command, matched by `id`
// - JSON object      -> single-command collapse, treated as a 1-element array
// - anything else    -> `ParseError` per command

use serde_json::Value;

use super::models::{CliMethod, ResponseView, ResultCode, RpcRequest};

/// Build the batched request array. Ids are 1-based request positions.
pub fn build_payload(method: CliMethod, commands: &[&str]) -> Vec<RpcRequest> {
    commands
        .iter()
        .zip(1u64..)
        .map(|(cmd, id)| RpcRequest::new(method, *cmd, id))
        .collect()
}

/// A failure view for every command, all sharing one code and message.
pub fn uniform_failure(commands: &[&str], code: ResultCode, message: &str) -> Vec<ResponseView> {
    commands
        .iter()
        .map(|cmd| ResponseView::failure(*cmd, code, message))
        .collect()
}

/// Views for a non-200 HTTP status. The body is never inspected.
pub fn from_status(commands: &[&str], status: reqwest::StatusCode) -> Vec<ResponseView> {
    let reason = status.canonical_reason().unwrap_or("unknown status");
    uniform_failure(commands, ResultCode::from_status(status), reason)
}

/// Views for an HTTP 200 body.
pub fn from_body(method: CliMethod, commands: &[&str], body: &str) -> Vec<ResponseView> {
    let elements = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items,
        Ok(obj @ Value::Object(_)) => vec![obj],
        Ok(other) => {
            let message = format!("unexpected response shape: {}", kind_of(&other));
            return uniform_failure(commands, ResultCode::ParseError, &message);
        }
        Err(e) => {
            return uniform_failure(commands, ResultCode::ParseError, &format!("invalid JSON: {e}"));
        }
    };

    commands
        .iter()
        .zip(1u64..)
        .enumerate()
        .map(|(index, (cmd, id))| {
            let element = elements
                .iter()
                .find(|el| element_id(el) == Some(id))
                .or_else(|| elements.get(index));
            match element {
                Some(el) => view_from_element(method, cmd, el),
                None => ResponseView::failure(*cmd, ResultCode::ParseError, "no response for command"),
            }
        })
        .collect()
}

fn view_from_element(method: CliMethod, cmd: &str, element: &Value) -> ResponseView {
    if let Some(err) = element.get("error").filter(|e| !e.is_null()) {
        let code = err.get("code").and_then(as_code).unwrap_or(500);
        let mut message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("command failed")
            .to_owned();
        if let Some(detail) = err.pointer("/data/msg").and_then(Value::as_str) {
            message.push_str(": ");
            message.push_str(detail.trim());
        }
        let mut view = ResponseView::failure(cmd, ResultCode::from_code(code), message);
        view.raw = element.to_string();
        return view;
    }

    let Some(result) = element.get("result") else {
        return ResponseView::failure(cmd, ResultCode::ParseError, "element has neither result nor error");
    };

    match method {
        CliMethod::Cli => {
            let body = result.get("body").filter(|b| !b.is_null()).cloned();
            ResponseView::success(cmd, body, element.to_string())
        }
        CliMethod::CliAscii => {
            let msg = result
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            ResponseView::success(cmd, None, msg)
        }
    }
}

/// NX-API emits ids and codes as numbers or numeric strings.
fn as_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn element_id(element: &Value) -> Option<u64> {
    element
        .get("id")
        .and_then(as_code)
        .and_then(|id| u64::try_from(id).ok())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
