use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Serialize;

use crate::adaptive::{AdaptiveOutcome, Extremum};
use crate::shor::FactorAttempt;

#[derive(Serialize, Debug)]
#[serde(tag = "eventType")]
pub enum Event {
    RunStart(RunStartInfo),
    GroverResult(GroverInfo),
    AdaptiveResult(AdaptiveInfo),
    ShorAttempt(ShorAttemptInfo),
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RunStartInfo {
    pub algorithm: String,
    pub seed: u64,
    pub noisy: bool,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GroverInfo {
    pub num_qubits: usize,
    pub marked: usize,
    pub iterations: usize,
    pub success_probability: f64,
    pub shots: u32,
    pub hits: u32,
    pub counts: BTreeMap<String, u32>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveInfo {
    pub database_size: usize,
    pub threshold: usize,
    pub extremum: Extremum,
    #[serde(flatten)]
    pub outcome: AdaptiveOutcome,
    pub found_extremum: bool,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ShorAttemptInfo {
    pub attempt: usize,
    pub target: u64,
    pub base: u64,
    pub result: FactorAttempt,
}

/// Writes one event as a single line of JSON.
pub fn emit_event(event: &Event, writer: &mut impl Write) -> io::Result<()> {
    let json_output = serde_json::to_string(event)?;
    writeln!(writer, "{}", json_output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::Phase;

    #[test]
    fn events_are_tagged_json_lines() {
        let event = Event::RunStart(RunStartInfo {
            algorithm: "grover".to_string(),
            seed: 7,
            noisy: false,
        });
        let mut buffer = Vec::new();
        emit_event(&event, &mut buffer).unwrap();
        let line = String::from_utf8(buffer).unwrap();
        assert_eq!(
            line,
            "{\"eventType\":\"RunStart\",\"algorithm\":\"grover\",\"seed\":7,\"noisy\":false}\n"
        );
    }

    #[test]
    fn shor_attempts_carry_their_verdict() {
        let event = Event::ShorAttempt(ShorAttemptInfo {
            attempt: 1,
            target: 15,
            base: 7,
            result: FactorAttempt::Nontrivial {
                factors: (3, 5),
                phase: Some(Phase::new(1, 4).unwrap()),
                period: Some(4),
            },
        });
        let value: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["eventType"], "ShorAttempt");
        assert_eq!(value["result"]["verdict"], "nontrivial");
        assert_eq!(value["result"]["factors"], serde_json::json!([3, 5]));
        assert_eq!(value["result"]["phase"]["denominator"], 4);
    }

    #[test]
    fn adaptive_outcome_is_flattened() {
        let event = Event::AdaptiveResult(AdaptiveInfo {
            database_size: 8,
            threshold: 5,
            extremum: Extremum::Maximum,
            outcome: AdaptiveOutcome {
                index: 3,
                rounds: 9,
                improvements: 2,
            },
            found_extremum: true,
        });
        let value: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["extremum"], "maximum");
        assert_eq!(value["index"], 3);
        assert_eq!(value["rounds"], 9);
        assert_eq!(value["foundExtremum"], true);
    }
}
