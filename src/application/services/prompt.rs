use crate::domain::ConversationTurn;

/// Fixed parts of every tutor prompt.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub persona: String,
    pub creator: String,
    pub rules: Vec<String>,
    pub no_context: String,
}

/// Everything that varies per turn. Built fresh for each question.
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub context: String,
    pub history: &'a [ConversationTurn],
    pub question: &'a str,
}

impl PromptTemplate {
    pub fn system_instruction(&self) -> String {
        let mut out = format!("{}\nYou were created by {}.\n\nYour role:", self.persona, self.creator);
        for rule in &self.rules {
            out.push_str("\n- ");
            out.push_str(rule);
        }
        out
    }

    pub fn render(&self, ctx: &PromptContext<'_>) -> String {
        let context = if ctx.context.trim().is_empty() {
            self.no_context.as_str()
        } else {
            ctx.context.as_str()
        };

        let history = if ctx.history.is_empty() {
            "(none)".to_string()
        } else {
            ctx.history
                .iter()
                .map(|t| format!("{}: {}", t.role.speaker(), t.text))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "{}\n\nContext from textbooks:\n{}\n\nPrevious conversation:\n{}\n\n\
             Student's question: {}\n\nYour response (be encouraging and clear):",
            self.system_instruction(),
            context,
            history,
            ctx.question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> PromptTemplate {
        PromptTemplate {
            persona: "You are a tutor.".to_string(),
            creator: "Test Team".to_string(),
            rules: vec!["Be clear".to_string(), "Be kind".to_string()],
            no_context: "No textbook material.".to_string(),
        }
    }

    #[test]
    fn test_render_orders_sections() {
        let history = vec![
            ConversationTurn::user("What is a mirror?"),
            ConversationTurn::assistant("A reflecting surface."),
        ];
        let prompt = template().render(&PromptContext {
            context: "Source: light.txt, Page: 2\nContent: Mirrors reflect.\n".to_string(),
            history: &history,
            question: "Concave ones?",
        });

        let persona = prompt.find("You are a tutor.").unwrap();
        let creator = prompt.find("created by Test Team").unwrap();
        let context = prompt.find("Mirrors reflect.").unwrap();
        let first_turn = prompt.find("Student: What is a mirror?").unwrap();
        let second_turn = prompt.find("Tutor: A reflecting surface.").unwrap();
        let question = prompt.find("Student's question: Concave ones?").unwrap();

        assert!(persona < creator);
        assert!(creator < context);
        assert!(context < first_turn);
        assert!(first_turn < second_turn);
        assert!(second_turn < question);
        assert!(prompt.contains("- Be clear\n- Be kind"));
    }

    #[test]
    fn test_render_falls_back_without_context() {
        let prompt = template().render(&PromptContext {
            context: String::new(),
            history: &[],
            question: "Hi",
        });

        assert!(prompt.contains("Context from textbooks:\nNo textbook material."));
        assert!(prompt.contains("Previous conversation:\n(none)"));
    }
}
