//! Built-in `calculator` tool: evaluates an arithmetic expression.
//!
//! Numeric literals are evaluated as floats, so `7/2` is `3.5`.

use std::sync::Arc;

use evalexpr::Value;

use crate::tools::{ToolError, ToolMeta, ToolOutcome, ToolRegistry};

pub const NAME: &str = "calculator";

/// Evaluate `expression`.
///
/// Returns `"The result of <expression> is <value>"` on success.  An
/// expression that evaluates to nothing (e.g. empty input) is an error.
pub fn evaluate(expression: &str) -> Result<String, ToolError> {
    let fail = |reason: String| ToolError::Evaluation {
        expression: expression.to_string(),
        reason,
    };
    let value = evalexpr::eval(&float_literals(expression)).map_err(|e| fail(e.to_string()))?;
    match value {
        Value::Empty => return Err(fail("expression produced no value".into())),
        Value::Float(f) if !f.is_finite() => return Err(fail(format!("non-finite result {f}"))),
        _ => {}
    }
    Ok(format!("The result of {expression} is {}", render(&value)))
}

/// Rewrite bare integer literals (`12`) as float literals (`12.0`).
///
/// Digits inside identifiers, string literals, or literals that already
/// carry a fraction or exponent are left alone.
fn float_literals(expression: &str) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let mut out = String::with_capacity(expression.len() + 8);
    let mut in_string = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if c == '"' {
            in_string = true;
            out.push(c);
            i += 1;
            continue;
        }
        let glued = i > 0 && is_word_or_dot(chars[i - 1]);
        let starts_literal = c.is_ascii_digit() && !glued;
        if !starts_literal {
            out.push(c);
            i += 1;
            continue;
        }
        while i < chars.len() && chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
        }
        let continues = chars
            .get(i)
            .is_some_and(|&n| is_word_or_dot(n));
        if !continues {
            out.push_str(".0");
        }
    }
    out
}

fn is_word_or_dot(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn register(reg: &mut ToolRegistry) {
    reg.register(
        ToolMeta::string_input(NAME, "Returns the result of a math calculation."),
        Arc::new(|input: String| {
            Box::pin(async move { ToolOutcome::from(evaluate(&input)) })
        }),
    );
}
