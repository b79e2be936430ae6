use flavor_api::{load_collection, ApiError, FlavorFilter, FlavorSource, RawFlavor};
use flavor_core::{ExtraSpecs, SortKey};
use os_flavor_selector::interactive::{self, Action, Facet, Frontend, Screen, Session};
use os_flavor_selector::{output, CliError, Result};
use std::collections::VecDeque;
use std::str::FromStr;

struct FixedSource(Vec<RawFlavor>);

impl FlavorSource for FixedSource {
    async fn list_flavors(&self) -> std::result::Result<Vec<RawFlavor>, ApiError> {
        Ok(self.0.clone())
    }
}

fn raw(id: &str, name: &str, vcpus: u32, ram: u64) -> RawFlavor {
    RawFlavor {
        id: id.to_string(),
        name: name.to_string(),
        vcpus,
        ram,
        disk: 20,
        swap: 0,
        ephemeral: 0,
        description: String::new(),
        is_public: true,
        rxtx_factor: 1.0,
        extra_specs: ExtraSpecs::new(),
    }
}

fn source() -> FixedSource {
    FixedSource(vec![
        raw("1", "m1.tiny", 1, 512),
        raw("2", "m1.small", 1, 2048),
        raw("3", "m1.medium", 2, 4096),
        raw("4", "m1.large", 4, 8192),
        raw("5", "m1.xlarge", 8, 16384),
        raw("4", "m1.large", 4, 8192),
    ])
}

/// Feeds a fixed list of answers and keeps the names shown on each screen
struct Script {
    answers: VecDeque<&'static str>,
    shown: Vec<Vec<String>>,
}

impl Script {
    fn new(answers: &[&'static str]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            shown: Vec::new(),
        }
    }

    fn answer(&mut self) -> Result<&'static str> {
        self.answers
            .pop_front()
            .ok_or_else(|| CliError::InvalidInput("no more answers".to_string()))
    }
}

impl Frontend for Script {
    fn draw(&mut self, screen: &Screen) -> Result<()> {
        self.shown
            .push(screen.table.rows().iter().map(|row| row[1].clone()).collect());
        Ok(())
    }

    fn read_action(&mut self) -> Result<Action> {
        self.answer()?.parse()
    }

    fn read_facet(&mut self) -> Result<Facet> {
        self.answer()?.parse()
    }

    fn read_text(&mut self, _prompt: &str) -> Result<String> {
        Ok(self.answer()?.to_string())
    }

    fn read_number<T>(&mut self, _prompt: &str) -> Result<T>
    where
        T: FromStr + Clone + ToString,
        T::Err: ToString,
    {
        T::from_str(self.answer()?).map_err(|e| CliError::InvalidInput(e.to_string()))
    }
}

#[tokio::test]
async fn test_batch_json_output_after_filtering() {
    let mut filter = FlavorFilter::default();
    filter.set_vcpu_range(2, 0);

    let flavors = load_collection(&source(), filter).await.unwrap();
    let selected = output::select(&flavors, Some(SortKey::Memory), true);

    let mut out = Vec::new();
    output::write_json(&mut out, &selected).unwrap();
    let text = String::from_utf8(out).unwrap();

    let names: Vec<String> = text
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["name"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(names, vec!["m1.xlarge", "m1.large", "m1.medium"]);
}

#[tokio::test]
async fn test_interactive_session_narrows_and_reorders() {
    let mut flavors = load_collection(&source(), FlavorFilter::default())
        .await
        .unwrap();
    let mut script = Script::new(&[
        "3", "o", // memory, largest first
        "f", "m", "2", "8", // 2..=8 GiB
        "f", "n", "large", // name contains "large"
        "f", "m", "0", "0", // clear memory bounds
        "quit",
    ]);

    let session = interactive::run(&mut flavors, Session::default(), &mut script).unwrap();

    assert_eq!(session.sort_by, SortKey::Memory);
    assert!(session.sort_descending);
    assert_eq!(
        script.shown,
        vec![
            vec!["m1.large", "m1.medium", "m1.small", "m1.tiny", "m1.xlarge"],
            vec!["m1.tiny", "m1.small", "m1.medium", "m1.large", "m1.xlarge"],
            vec!["m1.xlarge", "m1.large", "m1.medium", "m1.small", "m1.tiny"],
            vec!["m1.large", "m1.medium", "m1.small"],
            vec!["m1.large"],
            vec!["m1.xlarge", "m1.large"],
        ]
    );
}
