//! Surveyflow CLI - survey flow validation and scoring.

use std::io::stdout;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use surveyflow::analytics::{classify_with_observer, AnalyticsInput};
use surveyflow::cli::{Cli, Command};
use surveyflow::config::Config;
use surveyflow::core::{Error, TracingObserver};
use surveyflow::graph::build_graph;
use surveyflow::model::{load_document, AnswerSet, SurveyDocument};
use surveyflow::output::write_report;
use surveyflow::report::SurveyValidator;
use surveyflow::score::ScoreEngine;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> surveyflow::core::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default(".")?,
    };

    if cli.no_color || !config.output.color {
        colored::control::set_override(false);
    }
    let format = cli.format.unwrap_or(config.output.format);
    let mut out = stdout();

    match cli.command {
        Command::Validate(args) => {
            let survey = load_survey(&args.survey.survey)?;
            let validator = SurveyValidator::new(config);
            let result = validator.validate_with_observer(
                &survey.questions,
                survey.score_config.as_ref(),
                &TracingObserver,
            );
            write_report(&result, format, &mut out)?;
            if args.strict && !result.can_publish {
                return Err(Error::publish_blocked(result.summary.error_count));
            }
        }
        Command::Trace(args) => {
            let survey = load_survey(&args.survey.survey)?;
            let answers: AnswerSet = load_document(&args.answers)?;
            let engine = match args.rollup {
                Some(policy) => ScoreEngine::new(policy),
                None => ScoreEngine::from_config(&config),
            };
            let score_config = survey.score_config.unwrap_or_default();
            let trace = engine.compute(&survey.questions, &score_config, &answers, &TracingObserver);
            write_report(&trace, format, &mut out)?;
        }
        Command::Graph(args) => {
            let survey = load_survey(&args.survey)?;
            let mut graph = build_graph(&survey.questions);
            let reachable = surveyflow::analyzers::reachability::reachable_positions(&graph);
            graph.mark_reachable(&reachable);
            write_report(&graph, format, &mut out)?;
        }
        Command::Classify(args) => {
            let input: AnalyticsInput = load_document(&args.input)?;
            let result = classify_with_observer(&input, &TracingObserver);
            write_report(&result, format, &mut out)?;
        }
    }

    Ok(())
}

fn load_survey(path: &Path) -> surveyflow::core::Result<SurveyDocument> {
    let survey = SurveyDocument::from_path(path)?;
    tracing::debug!(
        path = %path.display(),
        questions = survey.questions.len(),
        scoring = survey.score_config.as_ref().is_some_and(|c| c.enabled),
        "loaded survey"
    );
    Ok(survey)
}
