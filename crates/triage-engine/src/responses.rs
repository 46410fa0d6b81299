//! Caller-facing wording for incoming calls and the call input menu
//!
//! High priority callers are queued straight away; everyone else hears the
//! menu of three choices (agent, automated help, message). Menu speech is
//! matched by substring, so both spoken words and keypad digits work.

use crate::types::RoutingDecision;

/// Spoken when routing fails for any reason
pub const FALLBACK_ANNOUNCEMENT: &str =
    "I'm sorry, we couldn't analyze your request. Let me connect you with an agent.";

pub const LEAVE_MESSAGE_PROMPT: &str = "Please leave your message after the tone.";

pub const NOT_UNDERSTOOD_PROMPT: &str = "I'm sorry, I didn't understand that. Please try again.";

pub const FEEDBACK_PROMPT: &str = "Was this information helpful? Please say yes or no.";

pub const MENU_OPTIONS: &str = "Would you like to: 1) Speak with an agent, 2) Get automated assistance, or 3) Leave a message?";

pub const VOICEMAIL_SAVED: &str =
    "Thank you for your message. We will get back to you as soon as possible.";

pub const VOICEMAIL_FAILED: &str =
    "We apologize, but we encountered an error while saving your message. Please try again later.";

const GENERAL_RESPONSE: &str =
    "How can I assist you today? Please provide more details about what you need help with.";

/// What the caller asked for at the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerChoice {
    ConnectAgent,
    Automated,
    LeaveMessage,
    Unrecognized,
}

impl CallerChoice {
    /// Checked in menu order; "leave a message for an agent" connects
    pub fn parse(speech: &str) -> Self {
        let speech = speech.to_lowercase();
        if speech.contains("agent") || speech.contains('1') {
            CallerChoice::ConnectAgent
        } else if speech.contains("automated") || speech.contains('2') {
            CallerChoice::Automated
        } else if speech.contains("message") || speech.contains('3') {
            CallerChoice::LeaveMessage
        } else {
            CallerChoice::Unrecognized
        }
    }

    /// Whether answering this choice needs a routing decision
    pub fn needs_routing(&self) -> bool {
        matches!(self, CallerChoice::ConnectAgent | CallerChoice::Automated)
    }
}

/// Self-service answer for a classified intent
pub fn automated_response(intent: &str) -> &'static str {
    match intent.trim().to_ascii_lowercase().as_str() {
        "billing" => {
            "For billing inquiries, you can check your balance and make payments through our website or mobile app. Would you like me to guide you through the process?"
        }
        "technical" => {
            "I can help you with technical issues. Could you please describe the problem you're experiencing in more detail?"
        }
        "sales" => {
            "Thank you for your interest in our products. I can provide information about our current offerings and promotions. What specific product are you interested in?"
        }
        "complaint" => {
            "I understand you have a concern. Please let me know more about the issue, and I'll do my best to help you resolve it."
        }
        _ => GENERAL_RESPONSE,
    }
}

/// Menu offered to callers who are not queued straight away
pub fn menu_prompt(intent: Option<&str>) -> String {
    match intent {
        Some(intent) => format!("I understand you're calling about {}. {}", intent, MENU_OPTIONS),
        None => MENU_OPTIONS.to_string(),
    }
}

/// Spoken to high priority callers on their way into the queue
pub fn priority_announcement(decision: &RoutingDecision) -> String {
    format!(
        "Thank you for calling. I understand this is important. Please hold while I connect you to an agent. Estimated wait time is {} minutes.",
        decision.estimated_wait_time
    )
}

pub fn wait_announcement(decision: &RoutingDecision) -> String {
    format!(
        "Thank you. I'll connect you to an agent. Estimated wait time is {} minutes.",
        decision.estimated_wait_time
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentType, Department, Priority};

    #[test]
    fn choices_follow_menu_order() {
        assert_eq!(CallerChoice::parse("An AGENT please"), CallerChoice::ConnectAgent);
        assert_eq!(CallerChoice::parse("1"), CallerChoice::ConnectAgent);
        assert_eq!(CallerChoice::parse("automated help"), CallerChoice::Automated);
        assert_eq!(CallerChoice::parse("two, I mean 2"), CallerChoice::Automated);
        assert_eq!(CallerChoice::parse("leave a message"), CallerChoice::LeaveMessage);
        assert_eq!(
            CallerChoice::parse("message for an agent"),
            CallerChoice::ConnectAgent
        );
        assert_eq!(CallerChoice::parse("what?"), CallerChoice::Unrecognized);
        assert!(!CallerChoice::LeaveMessage.needs_routing());
    }

    #[test]
    fn unknown_intents_get_the_general_answer() {
        assert!(automated_response("Billing").starts_with("For billing inquiries"));
        assert_eq!(automated_response("refund"), GENERAL_RESPONSE);
        assert_eq!(automated_response("general"), GENERAL_RESPONSE);
    }

    #[test]
    fn menu_names_the_intent_when_known() {
        assert_eq!(
            menu_prompt(Some("billing")),
            "I understand you're calling about billing. Would you like to: 1) Speak with an agent, 2) Get automated assistance, or 3) Leave a message?"
        );
        assert_eq!(menu_prompt(None), MENU_OPTIONS);
    }

    #[test]
    fn announcement_states_wait_minutes() {
        let decision = RoutingDecision {
            priority: Priority::High,
            department: Department::Support,
            agent_type: AgentType::Specialist,
            estimated_wait_time: 20,
        };
        assert_eq!(
            wait_announcement(&decision),
            "Thank you. I'll connect you to an agent. Estimated wait time is 20 minutes."
        );
        assert!(priority_announcement(&decision)
            .starts_with("Thank you for calling. I understand this is important."));
        assert!(priority_announcement(&decision).ends_with("Estimated wait time is 20 minutes."));
    }
}
