use clap::Parser;
use genmatch::config::{Config, ManagerWeighting};
use genmatch::data::{GraduatePreference, Placement, Preferences};
use genmatch::interfaces::command_line::{CommandLine, CommandLineArgs};
use genmatch::interfaces::session::{EvaluateRequest, InitRequest, RunRequest, Session};
use genmatch::interfaces::Message;
use genmatch::objectives::default::PreferenceObjective;
use genmatch::objectives::Objective;
use genmatch::representation::Assignment;
use std::fs::{create_dir_all, read_to_string, write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const GRADUATES: &str = "Graduate,Choice 1,Choice 2,Choice 3
G1,P2,P1,P3
G2,P1,P2,P3
G3,P1,,
";

const PLACEMENTS: &str = "Placement,Quota,Choice 1
P1,1,G3
P2,2,
P3,1,
";

fn small_instance() -> InitRequest {
    InitRequest {
        graduate_preferences: vec![
            GraduatePreference {
                id: 1,
                placement_rankings: vec![2, 1, 3],
            },
            GraduatePreference {
                id: 2,
                placement_rankings: vec![1, 2, 3],
            },
            GraduatePreference {
                id: 3,
                placement_rankings: vec![1],
            },
        ],
        placements: vec![
            Placement {
                id: 1,
                quota: 1,
                graduate_rankings: vec![3],
            },
            Placement {
                id: 2,
                quota: 2,
                graduate_rankings: vec![],
            },
            Placement {
                id: 3,
                quota: 1,
                graduate_rankings: vec![],
            },
        ],
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("genmatch-{name}-{}", std::process::id()));
    create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn search_reaches_the_best_feasible_matching() {
    let mut session = Session::new();
    session.init(small_instance()).unwrap();
    let preferences =
        Preferences::new(small_instance().graduate_preferences, small_instance().placements)
            .unwrap();
    let objective = PreferenceObjective::new(&preferences, ManagerWeighting::UNSCALED);
    let feasible: Assignment = [(1, 2), (2, 2), (3, 1)].into_iter().collect();
    assert_eq!(objective.fitness(&feasible), 39.0);
    for seed in 0..5 {
        let request = RunRequest {
            population_size: Some(100),
            seed: Some(seed),
            ..RunRequest::new(50)
        };
        let result = session.run(request).unwrap();
        assert!(result.fitness >= objective.fitness(&feasible), "seed {seed}");
        assert_eq!(result.fitness, objective.fitness(&result.solution));
    }
}

#[test]
fn evaluation_of_the_example_assignment() {
    let mut session = Session::new();
    session.init(small_instance()).unwrap();
    let solution: Assignment = [(1, 1), (2, 1), (3, 1)].into_iter().collect();
    let lines = session.evaluate(EvaluateRequest { solution }).unwrap();
    assert_eq!(
        lines,
        vec![
            "Graduates with their first choice: 2/3",
            "Graduates with one of their top 2 choices: 3/3",
            "Managers with their first choice: 1/3",
            "Managers with one of their top 2 choices: 1/3",
        ]
    );
}

#[test]
fn messages_arrive_in_order() {
    let received = Arc::new(Mutex::new(vec![]));
    let sink = received.clone();
    let mut session = Session::new();
    session.set_callback(move |message| sink.lock().unwrap().push(message.clone()));
    session.init(small_instance()).unwrap();
    let request = RunRequest {
        seed: Some(11),
        ..RunRequest::new(20)
    };
    session.run(request).unwrap();
    let received = received.lock().unwrap();
    let progress: Vec<u8> = received
        .iter()
        .filter_map(|m| match m {
            Message::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(progress, (1..=20).map(|g| g * 5).collect::<Vec<u8>>());
    assert!(matches!(received.last(), Some(Message::Result(_))));
    let json = serde_json::to_value(received.last().unwrap()).unwrap();
    assert_eq!(json["type"], "result");
    assert_eq!(json["payload"]["evaluation"].as_array().unwrap().len(), 4);
}

#[test]
fn command_line_reads_csv_and_saves_results() {
    let dir = scratch_dir("cli");
    let graduates = dir.join("graduates.csv");
    let placements = dir.join("placements.csv");
    let config = dir.join("config.yaml");
    write(&graduates, GRADUATES).unwrap();
    write(&placements, PLACEMENTS).unwrap();
    write(
        &config,
        "optimization:\n  iterations: 40\n  population_size: 12\n  seed: 3\n",
    )
    .unwrap();
    let args = CommandLineArgs::parse_from([
        "genmatch".into(),
        config.clone(),
        "-g".into(),
        graduates,
        "-p".into(),
        placements,
        "optimize".into(),
    ]);
    let command_line = CommandLine::new(args, Some(dir.join("output")));
    let init = command_line.read_preferences().unwrap();
    assert_eq!(init.graduate_preferences, small_instance().graduate_preferences);
    assert_eq!(init.placements, small_instance().placements);

    let config: Config = command_line.read_config().unwrap();
    let request = command_line.run_request(&config);
    assert_eq!(request.seed, Some(3));
    let mut session = Session::new();
    session.init(init).unwrap();
    let result = session.run_with(request, &command_line).unwrap();

    let saved = read_to_string(dir.join("output").join("result.yaml")).unwrap();
    assert!(saved.contains("fitness"));
    let solution = command_line
        .read_solution(&dir.join("output").join("solution.csv"))
        .unwrap();
    assert_eq!(solution, result.solution);
}
