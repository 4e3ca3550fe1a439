//! Console prompts for the interactive launcher.

use crate::engine::Inputs;
use crate::error::{CrewError, Result};
use std::io::{BufRead, Write};

fn console_error(e: std::io::Error) -> CrewError {
    CrewError::UserError(format!("console I/O failed: {}", e))
}

/// Ask the operator to pick one of `flows` by number.
///
/// Invalid answers re-prompt; end of input aborts. An exact flow name is
/// accepted as well as its number.
pub fn select_flow<R: BufRead, W: Write>(
    flows: &[String],
    input: &mut R,
    output: &mut W,
) -> Result<String> {
    if flows.is_empty() {
        return Err(CrewError::UserError(
            "no flows available to choose from".to_string(),
        ));
    }

    writeln!(output, "Available flows:").map_err(console_error)?;
    for (i, flow) in flows.iter().enumerate() {
        writeln!(output, "  {}. {}", i + 1, flow).map_err(console_error)?;
    }

    loop {
        write!(output, "Select a flow [1-{}]: ", flows.len()).map_err(console_error)?;
        output.flush().map_err(console_error)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(console_error)? == 0 {
            return Err(CrewError::UserError("flow selection aborted".to_string()));
        }
        let answer = line.trim();

        let chosen = match answer.parse::<usize>() {
            Ok(n) if (1..=flows.len()).contains(&n) => Some(&flows[n - 1]),
            _ => flows.iter().find(|flow| flow.as_str() == answer),
        };
        match chosen {
            Some(flow) => return Ok(flow.clone()),
            None => writeln!(
                output,
                "Invalid selection '{}'; enter a number between 1 and {}.",
                answer,
                flows.len()
            )
            .map_err(console_error)?,
        }
    }
}

/// Read free text for `input_key` until end of input.
pub fn read_operator_input<R: BufRead, W: Write>(
    input_key: &str,
    input: &mut R,
    output: &mut W,
) -> Result<String> {
    writeln!(
        output,
        "Enter {} (finish with Ctrl-D on an empty line):",
        input_key.replace('_', " ")
    )
    .map_err(console_error)?;
    output.flush().map_err(console_error)?;

    let mut text = String::new();
    input.read_to_string(&mut text).map_err(console_error)?;
    Ok(text.trim().to_string())
}

/// Apply the fallback for empty operator text.
pub fn resolve_operator_text(
    text: &str,
    fallback: Option<&str>,
    input_key: &str,
) -> Result<String> {
    let text = text.trim();
    if !text.is_empty() {
        return Ok(text.to_string());
    }
    match fallback.map(str::trim).filter(|f| !f.is_empty()) {
        Some(fallback) => {
            tracing::info!(input_key, "no input given; using fallback_input");
            Ok(fallback.to_string())
        }
        None => Err(CrewError::UserError(format!(
            "no input provided for '{}' and no fallback_input is configured",
            input_key
        ))),
    }
}

/// Bind the operator text to `input_key` and add `--set` pairs.
pub fn build_inputs(input_key: &str, text: String, extra: &[(String, String)]) -> Inputs {
    let mut inputs = Inputs::new();
    inputs.insert(input_key.trim().to_string(), text);
    for (key, value) in extra {
        if inputs.insert(key.clone(), value.clone()).is_some() {
            tracing::warn!(key = %key, "--set overrides an input that was already bound");
        }
    }
    inputs
}
