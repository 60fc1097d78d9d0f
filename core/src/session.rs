use rand::Rng;

/// Key under which the active session identifier is persisted.
pub const SESSION_KEY: &str = "agent_session_id";

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "angel";

/// Number of random characters after the `|` separator.
pub const RANDOM_LEN: usize = 8;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a session identifier. Format: `<namespace>|` + 8 random base-36 chars.
pub fn generate_session_id(namespace: &str) -> String {
    let suffix: String = (0..RANDOM_LEN)
        .map(|_| BASE36[rand::thread_rng().gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{namespace}|{suffix}")
}

/// Check that a stored value still looks like something we generated.
/// Values written by other tools are kept as long as they are non-blank.
pub fn is_well_formed(id: &str, namespace: &str) -> bool {
    id.strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('|'))
        .is_some_and(|suffix| {
            suffix.len() == RANDOM_LEN && suffix.bytes().all(|b| BASE36.contains(&b))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_has_namespace_and_eight_base36_chars() {
        let id = generate_session_id(DEFAULT_NAMESPACE);
        assert!(id.starts_with("angel|"));
        let suffix = id.strip_prefix("angel|").unwrap();
        assert_eq!(suffix.len(), RANDOM_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert!(is_well_formed(&id, DEFAULT_NAMESPACE));
    }

    #[test]
    fn generated_ids_differ() {
        let a = generate_session_id("ns");
        let b = generate_session_id("ns");
        assert_ne!(a, b);
    }

    #[test]
    fn well_formed_rejects_other_shapes() {
        assert!(!is_well_formed("angel|abc", "angel"));
        assert!(!is_well_formed("other|abcdefgh", "angel"));
        assert!(!is_well_formed("angel|ABCDEFGH", "angel"));
        assert!(!is_well_formed("angelabcdefghi", "angel"));
    }
}
