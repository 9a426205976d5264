//! Fallback Generator — offline template used when the LLM cannot be reached.

const FALLBACK_TEMPLATE: &str = "FOR IMMEDIATE RELEASE

Announcing an Exciting Development in {topic}

Today we are proud to share news about {topic}. This milestone reflects our \
ongoing commitment to innovation and to delivering real value to the people we serve.

{topic} brings meaningful benefits to customers, partners and the wider community. \
We have worked carefully to address the questions this kind of change raises, and we \
will continue to listen and improve as it rolls out.

Further details will be shared in the coming weeks.

###";

/// Substitutes `topic` into a fixed statement skeleton. Pure; never touches the network.
pub fn fallback_statement(topic: &str) -> String {
    FALLBACK_TEMPLATE.replace("{topic}", topic.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_contains_topic() {
        let text = fallback_statement("X");
        assert!(text.starts_with("FOR IMMEDIATE RELEASE"));
        assert!(text.contains("Development in X"));
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(
            fallback_statement("Solar farm opening"),
            fallback_statement("Solar farm opening")
        );
    }

    #[test]
    fn test_fallback_trims_topic() {
        let text = fallback_statement("  Solar farm  ");
        assert!(text.contains("Development in Solar farm\n"));
    }
}
