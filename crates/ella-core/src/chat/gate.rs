//! Entitlement gate.
//!
//! Plain text chat is open to every plan. The web and image tools need the
//! pro plan. The decision is made once, at request time; the job carries
//! the plan flag along but never checks it again.

use ella_types::tool::Tool;

/// Text written to the placeholder when a free-plan caller asks for a tool.
pub const UPGRADE_NOTICE: &str = "You haven't pro plan to access the tools. Go to the [billing page](/billing) and purchase a plan to use this feature.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Denied,
}

pub fn admit(tool: Tool, has_pro_plan: bool) -> Admission {
    if tool.requires_pro_plan() && !has_pro_plan {
        Admission::Denied
    } else {
        Admission::Admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_always_admitted() {
        assert_eq!(admit(Tool::Text, false), Admission::Admitted);
        assert_eq!(admit(Tool::Text, true), Admission::Admitted);
    }

    #[test]
    fn test_tools_need_pro() {
        for tool in [Tool::Web, Tool::Image] {
            assert_eq!(admit(tool, false), Admission::Denied);
            assert_eq!(admit(tool, true), Admission::Admitted);
        }
    }
}
