//! Terminal password and secret input.

use anyhow::Context;
use searchtrack_core::SecretString;

/// Shortest password accepted when creating one.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Read the password from here instead of the terminal (scripts, CI).
pub const PASSWORD_ENV: &str = "SEARCHTRACK_PASSWORD";

/// Check a newly chosen password and its confirmation.
pub fn check_new_password(password: &str, confirm: &str) -> Result<(), &'static str> {
    if password != confirm {
        return Err("Passwords do not match.");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password should be at least 8 characters.");
    }
    Ok(())
}

/// Rough strength score from 0 (weak) to 4 (strong).
pub fn password_strength(password: &str) -> u8 {
    let mut score = 0;
    if password.chars().count() >= MIN_PASSWORD_LEN {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
    {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        score += 1;
    }
    if password.chars().any(|c| !c.is_alphanumeric()) {
        score += 1;
    }
    score
}

/// Label shown next to a strength score.
pub fn strength_label(score: u8) -> &'static str {
    match score {
        0 | 1 => "weak",
        2 => "fair",
        3 => "good",
        _ => "strong",
    }
}

fn from_env() -> Option<SecretString> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .map(SecretString::new)
}

/// Password for unlocking an existing key.
pub fn password() -> anyhow::Result<SecretString> {
    if let Some(password) = from_env() {
        return Ok(password);
    }
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    Ok(SecretString::new(password))
}

/// Password for encrypting a new key, asked twice.
pub fn new_password() -> anyhow::Result<SecretString> {
    if let Some(password) = from_env() {
        check_new_password(password.expose_secret(), password.expose_secret())
            .map_err(anyhow::Error::msg)?;
        return Ok(password);
    }

    let password =
        rpassword::prompt_password("New password: ").context("Failed to read password")?;
    let confirm =
        rpassword::prompt_password("Confirm password: ").context("Failed to read password")?;
    check_new_password(&password, &confirm).map_err(anyhow::Error::msg)?;

    let score = password_strength(&password);
    println!("Password strength: {}", strength_label(score));
    Ok(SecretString::new(password))
}

/// Hidden single-line input.
pub fn secret(prompt: &str) -> anyhow::Result<SecretString> {
    let value = rpassword::prompt_password(prompt).context("Failed to read input")?;
    Ok(SecretString::from_input(value))
}
