use color_eyre::Result;
use dialoguer::{Confirm, Input, Select};
use std::io::IsTerminal;

/// Prompts only make sense when a person is at the keyboard.
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// Prompt for a string value with optional default
pub fn prompt_string(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input_builder = Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true);

    if let Some(default_value) = default {
        input_builder = input_builder.default(default_value.to_string());
    }

    input_builder
        .interact_text()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read input: {}", e))
}

/// Prompt for yes/no with optional default
pub fn prompt_yes_no(prompt: &str, default: Option<bool>) -> Result<bool> {
    let mut confirm_builder = Confirm::new().with_prompt(prompt);

    if let Some(default_value) = default {
        confirm_builder = confirm_builder.default(default_value);
    }

    confirm_builder
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read confirmation: {}", e))
}

/// Pick one entry; `None` when the user escapes.
pub fn prompt_select(prompt: &str, choices: &[String]) -> Result<Option<usize>> {
    Select::new()
        .with_prompt(prompt)
        .items(choices)
        .default(0)
        .interact_opt()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read selection: {}", e))
}

/// Prompt for an optional rating between 1 and 10. Empty input skips.
pub fn prompt_rating(prompt: &str) -> Result<Option<u8>> {
    loop {
        let input = prompt_string(prompt, None)?;
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        match trimmed.parse::<u8>() {
            Ok(rating) if (1..=10).contains(&rating) => return Ok(Some(rating)),
            _ => eprintln!("Invalid input. Please enter a number from 1 to 10."),
        }
    }
}
