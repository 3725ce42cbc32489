//! URL search parameters mirroring the active search

use url::form_urlencoded;

use super::parser::{SearchTarget, DEFAULT_POSITION, DEFAULT_ROUND};

/// `company`, `position`, `round` and `searched` query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub company: Option<String>,
    pub position: Option<String>,
    pub round: Option<String>,
    pub searched: bool,
}

impl SearchParams {
    /// Parses a query string, with or without a leading `?`
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut params = Self::default();

        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim().to_string();
            match name.as_ref() {
                "company" => params.company = Some(value),
                "position" => params.position = Some(value),
                "round" => params.round = Some(value),
                "searched" => params.searched = value == "true",
                _ => {}
            }
        }

        params
    }

    pub fn from_target(target: &SearchTarget) -> Self {
        Self {
            company: Some(target.company.clone()),
            position: Some(target.position.clone()),
            round: Some(target.round.clone()),
            searched: true,
        }
    }

    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());

        if let Some(company) = &self.company {
            serializer.append_pair("company", company);
        }
        if let Some(position) = &self.position {
            serializer.append_pair("position", position);
        }
        if let Some(round) = &self.round {
            serializer.append_pair("round", round);
        }
        if self.searched {
            serializer.append_pair("searched", "true");
        }

        serializer.finish()
    }

    pub fn is_empty(&self) -> bool {
        self.target().is_none()
    }

    /// The target these params point at; requires a non-empty company
    pub fn target(&self) -> Option<SearchTarget> {
        let company = self.company.as_deref().filter(|c| !c.is_empty())?;

        let position = self
            .position
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_POSITION);
        let round = self
            .round
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_ROUND);

        Some(SearchTarget::new(company, position, round))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_decodes_values() {
        let params =
            SearchParams::from_query("?company=Jane+Street&position=Quant%20Dev&round=Onsite&searched=true");

        assert_eq!(params.company.as_deref(), Some("Jane Street"));
        assert_eq!(params.position.as_deref(), Some("Quant Dev"));
        assert!(params.searched);
        assert_eq!(
            params.target(),
            Some(SearchTarget::new("Jane Street", "Quant Dev", "Onsite"))
        );
    }

    #[test]
    fn test_missing_company_has_no_target() {
        let params = SearchParams::from_query("position=SWE&round=Technical");
        assert!(params.target().is_none());
        assert!(params.is_empty());
        assert!(SearchParams::from_query("company=&searched=true").is_empty());
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let params = SearchParams::from_query("company=Google");
        assert_eq!(
            params.target(),
            Some(SearchTarget::new("Google", "Software Engineer", "Technical"))
        );
    }

    #[test]
    fn test_to_query_from_target() {
        let params = SearchParams::from_target(&SearchTarget::new("Jane Street", "SWE", "Onsite"));
        assert_eq!(
            params.to_query(),
            "company=Jane+Street&position=SWE&round=Onsite&searched=true"
        );
        assert_eq!(SearchParams::default().to_query(), "");
    }
}
