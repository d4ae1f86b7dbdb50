use dialoguer::{Input, Password, Select};
use playstate_config::{InputProvider, SettingsError};

/// Interactive terminal prompts
pub struct DialoguerInput;

fn input_error(e: dialoguer::Error) -> SettingsError {
    SettingsError::Input(e.to_string())
}

impl InputProvider for DialoguerInput {
    fn text(&mut self, prompt: &str, default: Option<&str>) -> Result<String, SettingsError> {
        let mut input_builder = Input::<String>::new().with_prompt(prompt);
        match default {
            Some(default_value) => input_builder = input_builder.default(default_value.to_string()),
            None => input_builder = input_builder.allow_empty(true),
        }
        input_builder.interact_text().map_err(input_error)
    }

    fn secret(&mut self, prompt: &str) -> Result<String, SettingsError> {
        Password::new().with_prompt(prompt).interact().map_err(input_error)
    }

    fn select(&mut self, prompt: &str, options: &[String]) -> Result<usize, SettingsError> {
        Select::new()
            .with_prompt(prompt)
            .items(options)
            .default(0)
            .interact()
            .map_err(input_error)
    }
}
