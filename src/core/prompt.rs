//! Prompt assembly.
//!
//! Turns a persona, the turn log, and the new user input into the exact
//! request shape the routed model accepts. The routing decision fully
//! determines the shape: `SystemField` carries the persona in the native
//! system-instruction field and may replay history; `InlineText`
//! concatenates the persona ahead of the user text and is always
//! stateless. Images are always a discrete part, never spliced into text.

use crate::api::{Content, GenerateContentRequest, GenerationConfig, Part, SystemInstruction};
use crate::core::attachment::Attachment;
use crate::core::persona::Persona;
use crate::core::router::{PersonaStrategy, RoutingDecision};
use crate::core::session::{Role, TurnLog};

/// Separator between the inlined persona instruction and the user's
/// question under the `InlineText` strategy.
pub const INLINE_SEPARATOR: &str = "\n\nUser question: ";

const DEFAULT_TEMPERATURE: f32 = 0.4;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

fn default_generation_config() -> GenerationConfig {
    GenerationConfig {
        temperature: Some(DEFAULT_TEMPERATURE),
        max_output_tokens: Some(DEFAULT_MAX_OUTPUT_TOKENS),
    }
}

fn attachment_part(attachment: &Attachment) -> Part {
    Part::inline_data(attachment.mime_type.clone(), attachment.to_base64())
}

/// Build the request for one submission.
pub fn assemble(
    persona: &Persona,
    turn_log: &TurnLog,
    user_text: &str,
    attachment: Option<&Attachment>,
    decision: &RoutingDecision,
) -> GenerateContentRequest {
    match decision.strategy {
        PersonaStrategy::SystemField => {
            let mut contents = Vec::new();
            if decision.use_history {
                for turn in turn_log.turns() {
                    // History replays text only; images are sent with the
                    // turn that introduced them.
                    let parts = vec![Part::text(turn.content.clone())];
                    contents.push(match turn.role {
                        Role::User => Content::user(parts),
                        Role::Assistant => Content::model(parts),
                    });
                }
            }

            let mut parts = vec![Part::text(user_text)];
            if let Some(attachment) = attachment {
                parts.push(attachment_part(attachment));
            }
            contents.push(Content::user(parts));

            GenerateContentRequest {
                system_instruction: Some(SystemInstruction {
                    parts: vec![Part::text(persona.instruction.clone())],
                }),
                contents,
                generation_config: Some(default_generation_config()),
            }
        }
        PersonaStrategy::InlineText => {
            let combined = format!("{}{}{}", persona.instruction, INLINE_SEPARATOR, user_text);
            let mut parts = vec![Part::text(combined)];
            if let Some(attachment) = attachment {
                parts.push(attachment_part(attachment));
            }

            GenerateContentRequest {
                system_instruction: None,
                contents: vec![Content::user(parts)],
                generation_config: Some(default_generation_config()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::persona::{Mode, PersonaRegistry};
    use crate::core::router::{PersonaStrategy, RoutingDecision};
    use crate::core::session::Turn;

    fn decision(strategy: PersonaStrategy, use_history: bool) -> RoutingDecision {
        RoutingDecision {
            model_id: "test-model".to_string(),
            strategy,
            use_history,
        }
    }

    fn tiny_png_attachment() -> Attachment {
        const TINY_PNG: &[u8] = &[
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00,
            0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x78,
            0xDA, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x03, 0x01, 0x01, 0x00, 0xF7, 0x03, 0x41,
            0x43, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
        ];
        Attachment::from_bytes(TINY_PNG.to_vec()).unwrap()
    }

    fn text_of(part: &Part) -> &str {
        match part {
            Part::Text(text) => text,
            Part::InlineData(_) => panic!("expected a text part"),
        }
    }

    #[test]
    fn system_strategy_replays_history_in_order() {
        let registry = PersonaRegistry::builtin();
        let persona = registry.resolve(Mode::Solver);

        let mut log = TurnLog::default();
        log.append(Turn::user("What is 2+2?", None));
        log.append(Turn::assistant("It is 4."));
        log.append(Turn::user("And 3+3?", None));
        log.append(Turn::assistant("That is 6."));

        let request = assemble(
            persona,
            &log,
            "Now 5+5?",
            None,
            &decision(PersonaStrategy::SystemField, true),
        );

        assert!(request.system_instruction.is_some());
        // Exactly N history turns, then the new user text.
        assert_eq!(request.contents.len(), 5);
        assert_eq!(request.contents[0].role, "user");
        assert_eq!(text_of(&request.contents[0].parts[0]), "What is 2+2?");
        assert_eq!(request.contents[1].role, "model");
        assert_eq!(text_of(&request.contents[1].parts[0]), "It is 4.");
        assert_eq!(text_of(&request.contents[3].parts[0]), "That is 6.");
        assert_eq!(text_of(&request.contents[4].parts[0]), "Now 5+5?");
    }

    #[test]
    fn stateless_decision_ignores_the_turn_log() {
        let registry = PersonaRegistry::builtin();
        let persona = registry.resolve(Mode::Solver);

        let mut log = TurnLog::default();
        log.append(Turn::user("earlier question", None));
        log.append(Turn::assistant("earlier answer"));

        let request = assemble(
            persona,
            &log,
            "fresh question",
            None,
            &decision(PersonaStrategy::SystemField, false),
        );

        assert_eq!(request.contents.len(), 1);
        assert_eq!(text_of(&request.contents[0].parts[0]), "fresh question");
    }

    #[test]
    fn inline_strategy_concatenates_persona_and_omits_system_field() {
        let registry = PersonaRegistry::builtin();
        let persona = registry.resolve(Mode::HintCoach);

        let mut log = TurnLog::default();
        log.append(Turn::user("should not appear", None));

        let request = assemble(
            persona,
            &log,
            "How do I factor x^2-1?",
            None,
            &decision(PersonaStrategy::InlineText, false),
        );

        assert!(request.system_instruction.is_none());
        assert_eq!(request.contents.len(), 1);
        let combined = text_of(&request.contents[0].parts[0]);
        assert!(combined.starts_with(&persona.instruction));
        assert!(combined.ends_with("How do I factor x^2-1?"));
        assert!(combined.contains(INLINE_SEPARATOR));
        assert!(!combined.contains("should not appear"));
    }

    #[test]
    fn image_travels_as_a_discrete_part() {
        let registry = PersonaRegistry::builtin();
        let persona = registry.resolve(Mode::Solver);
        let attachment = tiny_png_attachment();
        let log = TurnLog::default();

        for strategy in [PersonaStrategy::SystemField, PersonaStrategy::InlineText] {
            let request = assemble(
                persona,
                &log,
                "What does this show?",
                Some(&attachment),
                &decision(strategy, false),
            );

            let parts = &request.contents.last().unwrap().parts;
            assert_eq!(parts.len(), 2);
            match &parts[1] {
                Part::InlineData(inline) => {
                    assert_eq!(inline.mime_type, "image/png");
                    assert!(!inline.data.is_empty());
                }
                Part::Text(_) => panic!("image must not be embedded in text"),
            }
            // The text part carries no image payload.
            assert!(!text_of(&parts[0]).contains(&attachment.to_base64()));
        }
    }

    #[test]
    fn requests_carry_default_generation_parameters() {
        let registry = PersonaRegistry::builtin();
        let persona = registry.resolve(Mode::ConceptCoach);
        let log = TurnLog::default();

        let request = assemble(
            persona,
            &log,
            "Why does ice float?",
            None,
            &decision(PersonaStrategy::SystemField, true),
        );

        let config = request.generation_config.unwrap();
        assert_eq!(config.max_output_tokens, Some(DEFAULT_MAX_OUTPUT_TOKENS));
        assert_eq!(config.temperature, Some(DEFAULT_TEMPERATURE));
    }
}
