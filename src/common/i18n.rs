// src/common/i18n.rs

use std::collections::HashMap;

// Catálogo de mensagens de erro por idioma.
// Idioma desconhecido ou chave ausente caem no português.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

const PT: &[(&str, &str)] = &[
    ("validation", "Um ou mais campos são inválidos."),
    ("invalid_input", "Dados inválidos"),
    ("not_found", "Recurso não encontrado"),
    ("conflict", "Conflito"),
    ("invalid_state", "Operação não permitida no estado atual"),
    ("forbidden", "Você não tem permissão para realizar esta ação."),
    ("email_exists", "Este e-mail já está em uso."),
    ("invalid_credentials", "E-mail ou senha inválidos."),
    ("invalid_token", "Token de autenticação inválido ou ausente."),
    ("user_not_found", "Usuário não encontrado."),
    ("internal", "Ocorreu um erro inesperado."),
];

const EN: &[(&str, &str)] = &[
    ("validation", "One or more fields are invalid."),
    ("invalid_input", "Invalid input"),
    ("not_found", "Resource not found"),
    ("conflict", "Conflict"),
    ("invalid_state", "Operation not allowed in the current state"),
    ("forbidden", "You are not allowed to perform this action."),
    ("email_exists", "This e-mail is already in use."),
    ("invalid_credentials", "Invalid e-mail or password."),
    ("invalid_token", "Missing or invalid authentication token."),
    ("user_not_found", "User not found."),
    ("internal", "An unexpected error occurred."),
];

impl I18nStore {
    pub const DEFAULT_LANG: &'static str = "pt";

    pub fn new() -> Self {
        let mut messages = HashMap::new();
        messages.insert("pt", PT.iter().copied().collect());
        messages.insert("en", EN.iter().copied().collect());
        Self { messages }
    }

    pub fn translate(&self, lang: &str, key: &str) -> &'static str {
        self.messages
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| {
                self.messages
                    .get(Self::DEFAULT_LANG)
                    .and_then(|catalog| catalog.get(key))
            })
            .copied()
            .unwrap_or("Erro")
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::new();
        assert_eq!(store.translate("de", "forbidden"), store.translate("pt", "forbidden"));
    }

    #[test]
    fn every_key_exists_in_both_languages() {
        for (key, _) in PT {
            assert!(EN.iter().any(|(k, _)| k == key), "faltando em en: {key}");
        }
    }
}
