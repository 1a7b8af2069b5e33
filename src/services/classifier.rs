/// Flags complaint text that mentions legal, regulatory or urgency terms.
///
/// Case-insensitive substring match against the keyword list from
/// `AppConfig::critical_keywords`.
pub fn is_critical(text: &str, keywords: &[String]) -> bool {
    let lowered = text.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .any(|k| lowered.contains(&k.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_critical_keywords;

    #[test]
    fn legal_threat_is_critical() {
        let keywords = default_critical_keywords();
        assert!(is_critical("Vou chamar o meu advogado", &keywords));
    }

    #[test]
    fn slow_internet_is_not_critical() {
        let keywords = default_critical_keywords();
        assert!(!is_critical("a minha internet está lenta", &keywords));
    }

    #[test]
    fn match_is_case_insensitive() {
        let keywords = default_critical_keywords();
        assert!(is_critical("URGENTE: sem serviço há 3 dias", &keywords));
        assert!(is_critical("vou à ANACOM amanhã", &keywords));
    }

    #[test]
    fn substring_inside_a_word_matches() {
        let keywords = default_critical_keywords();
        // "processo" appears inside "processos"
        assert!(is_critical("tenho dois processos abertos", &keywords));
    }

    #[test]
    fn empty_keyword_list_never_matches() {
        assert!(!is_critical("vou ao tribunal", &[]));
    }
}
