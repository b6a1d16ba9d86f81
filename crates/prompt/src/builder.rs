//! Prompt builder: renders Handlebars templates with input variables.

use crate::types::{BuiltPrompt, PromptDefinition};
use guidebot_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Every name listed in `definition.inputs` must be present in `variables`;
/// a missing input is an error rather than a silently empty section.
///
/// # Example
/// ```no_run
/// use guidebot_prompt::{build_prompt, builtin_prompt, GROUNDED_ANSWER_PROMPT_ID};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt(GROUNDED_ANSWER_PROMPT_ID)?;
/// let mut vars = HashMap::new();
/// vars.insert("context".to_string(), "Paris is the capital of France.".to_string());
/// vars.insert("question".to_string(), "What is the capital of France?".to_string());
/// vars.insert("sentinel".to_string(), "The answer is not available in the context.".to_string());
///
/// let built = build_prompt(&def, &vars)?;
/// println!("{}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: &HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    if let Some(missing) = definition
        .inputs
        .iter()
        .find(|name| !variables.contains_key(name.as_str()))
    {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' requires input '{}'",
            definition.id, missing
        )));
    }

    let user = render_template(&definition.template, variables)?;
    let system = match definition.system {
        Some(ref system) => Some(render_template(system, variables)?),
        None => None,
    };

    Ok(BuiltPrompt {
        source_prompt_id: definition.id.clone(),
        system,
        user,
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
