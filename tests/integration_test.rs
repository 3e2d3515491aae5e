#[cfg(test)]
mod tests {
    use anyhow::Result;
    use resume_search::config::Config;
    use resume_search::record::{JsonRecordSource, MatchResult, RawRecord, RecordSource};
    use resume_search::search::{
        QueryError, SearchError, SearchManager, SearchSession, SyntaxErrorKind, search,
    };
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_resumes() -> String {
        r#"[
            {
                "_id": { "$oid": "a1" },
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "summary": "Experienced with HuggingFace and AWS.",
                "skills": ["PyTorch", "Docker"]
            },
            {
                "_id": "b2",
                "name": "Bo Sample",
                "summary": "Skilled in Machine Learning and Python.",
                "experience": [
                    { "title": "Data Scientist", "company": "Acme", "description": "Built models on Azure" }
                ]
            },
            {
                "_id": "c3",
                "name": "Cy Placeholder",
                "skills": ["Java", "Spring-Boot"],
                "links": ["https://github.com/cy-placeholder"]
            },
            {
                "_id": "d4",
                "years": 5
            }
        ]"#
        .to_string()
    }

    fn setup_test_resumes() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let records_file = temp_dir.path().join("resumes.json");
        fs::write(&records_file, create_test_resumes()).unwrap();
        (temp_dir, records_file)
    }

    async fn load_session() -> Result<(TempDir, SearchSession)> {
        let (temp_dir, records_file) = setup_test_resumes();
        let config = Config::default();
        let source = JsonRecordSource::with_config(&records_file, config.clone());
        let session = SearchSession::load(&source, SearchManager::new(&config)?).await?;
        Ok((temp_dir, session))
    }

    fn ids(matches: &[MatchResult]) -> Vec<&str> {
        matches.iter().map(|m| m.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_records_from_file() -> Result<()> {
        let (_temp_dir, records_file) = setup_test_resumes();
        let source = JsonRecordSource::with_config(&records_file, Config::default());

        let records = source.fetch_all().await?;
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].id, "a1");
        assert!(records[0].text().contains("HuggingFace"));
        assert!(records[1].text().contains("Built models on Azure"));
        assert_eq!(records[3], RawRecord::without_text("d4"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let source = JsonRecordSource::with_config("/nonexistent/resumes.json", Config::default());
        let err = source.fetch_all().await.unwrap_err();
        assert!(err.to_string().contains("Failed to read records"));
    }

    #[tokio::test]
    async fn test_camel_case_scenario() -> Result<()> {
        let (_temp_dir, session) = load_session().await?;

        assert!(session.search("MachineLearning")?.iter().all(|m| m.id != "a1"));
        assert_eq!(ids(&session.search("HuggingFace AND AWS")?), vec!["a1"]);
        assert_eq!(ids(&session.search("huggingface")?), vec!["a1"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_phrase_and_split_scenario() -> Result<()> {
        let (_temp_dir, session) = load_session().await?;

        assert_eq!(ids(&session.search("\"Machine Learning\"")?), vec!["b2"]);
        assert_eq!(ids(&session.search("MachineLearning")?), vec!["b2"]);
        assert_eq!(ids(&session.search("machinelearning")?), vec!["b2"]);
        assert_eq!(ids(&session.search("machine-learning")?), vec!["b2"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_grouped_boolean_scenario() -> Result<()> {
        let (_temp_dir, session) = load_session().await?;

        let matches = session.search("(Java OR Python) AND (AWS OR Azure)")?;
        assert_eq!(ids(&matches), vec!["b2"]);

        let matches = session.search("Java OR Python")?;
        assert_eq!(ids(&matches), vec!["b2", "c3"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_query_scenario() -> Result<()> {
        let (_temp_dir, session) = load_session().await?;

        let err = session.search("(Java AND").unwrap_err();
        match err {
            SearchError::Query(QueryError::Syntax { kind, .. }) => {
                assert_eq!(kind, SyntaxErrorKind::MissingOperand);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_record_without_text_scenario() -> Result<()> {
        let (_temp_dir, session) = load_session().await?;

        let matches = session.search("Python OR Java OR AWS")?;
        assert_eq!(ids(&matches), vec!["a1", "b2", "c3"]);
        assert!(session.record("d4").is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_emails_and_urls_are_not_searchable() -> Result<()> {
        let (_temp_dir, session) = load_session().await?;

        assert!(session.search("example")?.is_empty());
        assert!(session.search("github")?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_hyphenated_skill_variants() -> Result<()> {
        let (_temp_dir, session) = load_session().await?;

        for query in ["Spring-Boot", "SpringBoot", "springboot", "spring AND boot", "Boot"] {
            assert_eq!(ids(&session.search(query)?), vec!["c3"], "{query}");
        }
        Ok(())
    }

    #[test]
    fn test_search_without_session() {
        let records = vec![
            RawRecord::new("1", "Rust, Go and Kubernetes"),
            RawRecord::without_text("2"),
            RawRecord::new("3", "Go microservices"),
        ];

        let matches = search(&records, "Go AND NOT").unwrap();
        assert!(matches.is_empty());

        let matches = search(&records, "go").unwrap();
        assert_eq!(ids(&matches), vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_configured_fields_only() -> Result<()> {
        let (_temp_dir, records_file) = setup_test_resumes();
        let config = Config {
            text_fields: vec!["skills".to_string()],
            ..Default::default()
        };
        let source = JsonRecordSource::with_config(&records_file, config.clone());
        let session = SearchSession::load(&source, SearchManager::new(&config)?).await?;

        assert_eq!(ids(&session.search("PyTorch OR Java")?), vec!["a1", "c3"]);
        assert!(session.search("HuggingFace")?.is_empty());
        Ok(())
    }
}
