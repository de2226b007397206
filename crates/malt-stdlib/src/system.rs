use std::io::{BufRead, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use malt_core::{check_arity, Env, MaltError, Value};

use crate::register_fn;

/// Show `prompt`, then read one line without its terminator. `None` at EOF.
fn prompt_line(
    prompt: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> std::io::Result<Option<String>> {
    output.write_all(prompt.as_bytes())?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}

pub fn register(env: &Env) {
    register_fn(env, "time-ms", |args| {
        check_arity!(args, "time-ms", 0);
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        Ok(Value::Int(ms))
    });

    register_fn(env, "readline", |args| {
        check_arity!(args, "readline", 1);
        let prompt = args[0]
            .as_str()
            .ok_or_else(|| MaltError::type_error("string", args[0].type_name()))?;
        let line = prompt_line(prompt, &mut std::io::stdin().lock(), &mut std::io::stdout())
            .map_err(|e| MaltError::eval(format!("readline: {e}")))?;
        Ok(line.map_or(Value::Nil, |l| Value::string(&l)))
    });
}
