use crate::infra::{InMemoryEvaluationRepository, InMemoryReviewNotifier};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;
use supplier_srm::config::ScoringConfig;
use supplier_srm::error::AppError;
use supplier_srm::workflows::evaluation::{
    EvaluationNumber, EvaluationService, EvaluationSummary, ItemType, NewEvaluation,
    NewEvaluationItem, SupplierRef,
};

type DemoService = EvaluationService<InMemoryEvaluationRepository, InMemoryReviewNotifier>;

const DEMO_SHEET: &str = "Item,Type,Weight,Score,Max Score,Unit,Description
On-time delivery,Quantitative,30,92,100,%,Purchase orders received inside the agreed window
Incoming quality,Quantitative,30,85,100,%,Lots accepted at goods-in inspection
Responsiveness,Qualitative,20,8,10,points,Buyer survey on query turnaround
";

#[derive(Args, Debug)]
pub(crate) struct EvaluationReportArgs {
    /// CSV sheet with columns Item,Type,Weight,Score,Max Score,Unit,Description
    #[arg(long)]
    pub(crate) items_csv: PathBuf,
    /// Overall score recorded by the evaluator (0-100)
    #[arg(long)]
    pub(crate) overall_score: f64,
    /// Supplier identifier printed on the report
    #[arg(long, default_value = "SUP-DEMO")]
    pub(crate) supplier_id: String,
    /// Supplier display name
    #[arg(long, default_value = "Demo Supplier")]
    pub(crate) supplier_name: String,
    /// Evaluation period label, for example 2025-Q3
    #[arg(long)]
    pub(crate) period: Option<String>,
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) evaluation_date: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reject the first submission before approving the corrected scorecard.
    #[arg(long)]
    pub(crate) with_rejection: bool,
}

pub(crate) fn run_evaluation_report(args: EvaluationReportArgs) -> Result<(), AppError> {
    let reader = BufReader::new(File::open(&args.items_csv)?);
    let summary = build_report(reader, &args)?;
    render_summary(&summary);
    Ok(())
}

fn build_report<Rd: Read>(
    reader: Rd,
    args: &EvaluationReportArgs,
) -> Result<EvaluationSummary, AppError> {
    let service = demo_service(Arc::default());
    let evaluation = service.create(NewEvaluation {
        evaluation_number: None,
        supplier: SupplierRef {
            supplier_id: args.supplier_id.clone(),
            name: args.supplier_name.clone(),
        },
        title: "Supplier performance report".to_string(),
        evaluation_period: args.period.clone(),
        evaluator: None,
        evaluation_date: Some(
            args.evaluation_date
                .unwrap_or_else(|| Local::now().date_naive()),
        ),
    })?;
    let number = evaluation.evaluation_number().clone();

    service.import_items(&number, reader)?;
    service.record_score(&number, args.overall_score)?;
    service.derive_grade(&number)?;
    Ok(service.summary(&number)?)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let notifier = Arc::new(InMemoryReviewNotifier::default());
    let service = demo_service(notifier.clone());

    println!("Supplier performance evaluation demo");
    let number = open_demo_scorecard(&service)?;
    println!("Opened draft {number}");

    let imported = service.import_items(&number, Cursor::new(DEMO_SHEET))?;
    println!("Imported {imported} evaluation items");
    let summary = service.summary(&number)?;
    println!("{}", summary.weight_message);

    if args.with_rejection {
        service.submit_for_review(&number, "j.alvarez")?;
        service.reject(&number, "r.okafor", "Cost criterion missing")?;
        println!("Review rejected: cost criterion missing");
    }

    service.add_item(
        &number,
        NewEvaluationItem {
            item_name: "Cost competitiveness".to_string(),
            item_type: ItemType::Quantitative,
            weight: 20.0,
            score: 74.0,
            max_score: 100.0,
            unit: Some("%".to_string()),
            description: Some("Price index against the category benchmark".to_string()),
        },
    )?;

    let derived = service.get(&number)?.calculate_actual_score();
    service.record_score(&number, derived.round())?;
    let grade = service.derive_grade(&number)?;
    println!("Recorded overall score {:.0} (grade {grade})", derived.round());

    service.submit_for_review(&number, "j.alvarez")?;
    service.approve(&number, "r.okafor")?;

    render_summary(&service.summary(&number)?);

    println!("\nReview notices");
    for notice in notifier.notices() {
        let details: Vec<String> = notice
            .details
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        println!(
            "- {} for {} ({})",
            notice.template,
            notice.evaluation_number,
            details.join(", ")
        );
    }
    Ok(())
}

fn demo_service(notifier: Arc<InMemoryReviewNotifier>) -> DemoService {
    EvaluationService::new(
        Arc::new(InMemoryEvaluationRepository::default()),
        notifier,
        ScoringConfig::default(),
    )
}

fn open_demo_scorecard(service: &DemoService) -> Result<EvaluationNumber, AppError> {
    let evaluation = service.create(NewEvaluation {
        evaluation_number: None,
        supplier: SupplierRef {
            supplier_id: "SUP-0042".to_string(),
            name: "Northwind Components".to_string(),
        },
        title: "Quarterly supplier scorecard".to_string(),
        evaluation_period: Some("2025-Q3".to_string()),
        evaluator: Some("j.alvarez".to_string()),
        evaluation_date: Some(Local::now().date_naive()),
    })?;
    Ok(evaluation.evaluation_number().clone())
}

pub(crate) fn render_summary(summary: &EvaluationSummary) {
    println!(
        "\nEvaluation {}: {}",
        summary.evaluation_number, summary.title
    );
    println!(
        "Supplier: {} ({})",
        summary.supplier.name, summary.supplier.supplier_id
    );
    if let Some(period) = &summary.evaluation_period {
        println!("Period: {period}");
    }
    println!("Status: {}", summary.status_label);

    println!("\nItems");
    for item in &summary.items {
        println!(
            "- {} [{}]: {} / {} at weight {}% -> {:.2} weighted ({:.1}%)",
            item.item_name,
            item.item_type_label,
            item.score,
            item.max_score,
            item.weight,
            item.weighted_score,
            item.score_percentage
        );
    }
    println!(
        "({} quantitative, {} qualitative)",
        summary.quantitative_items, summary.qualitative_items
    );
    println!("{}", summary.weight_message);

    println!("\nScores");
    println!("- Recorded: {:.2}", summary.recorded_score);
    println!("- Derived from items: {:.2}", summary.derived_score);
    if summary.scores_reconciled {
        println!("- Recorded and derived scores agree");
    } else {
        println!(
            "- Recorded and derived scores differ by {:.2}",
            summary.score_variance
        );
    }
    match summary.assigned_grade {
        Some(grade) => println!("- Grade: {grade} ({})", grade.label()),
        None => println!(
            "- Grade: not assigned (score suggests {})",
            summary.calculated_grade
        ),
    }

    if !summary.history.is_empty() {
        println!("\nReview history");
        for event in &summary.history {
            match &event.note {
                Some(note) => println!(
                    "- {} by {}: {} -> {} ({note})",
                    event.action, event.actor, event.from, event.to
                ),
                None => println!(
                    "- {} by {}: {} -> {}",
                    event.action, event.actor, event.from, event.to
                ),
            }
        }
    }
}
