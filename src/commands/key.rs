use crate::args::NormalizeKeyArgs;
use crate::commands::Out;
use crate::credentials::{normalize_private_key, ServiceAccountCredentials};
use crate::error::{ErrorType, IntoResult};
use crate::{utils, Result};
use anyhow::Context;
use tokio::io::AsyncReadExt;

/// Normalizes a private key read from `args.file` or, without a file, from stdin. The input may
/// be a bare key or a whole service account JSON file, in which case its `private_key` is used.
/// The normalized key is the display text.
pub async fn key_normalize(args: &NormalizeKeyArgs) -> Result<Out<()>> {
    let input = match args.file() {
        Some(path) => utils::read(path).await.pub_result(ErrorType::Request)?,
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Unable to read the key from stdin")
                .pub_result(ErrorType::Request)?;
            input
        }
    };
    let (key, from) = normalize_input(&input);
    let payload_lines = key.lines().count().saturating_sub(2);
    Ok(Out::new_message(format!(
        "Normalized the private key from {from} into {payload_lines} lines of base64"
    ))
    .with_display(key))
}

fn normalize_input(input: &str) -> (String, &'static str) {
    match ServiceAccountCredentials::from_json(input) {
        Ok(creds) => (creds.private_key, "the service account JSON"),
        Err(_) => (normalize_private_key(input), "the input"),
    }
}
