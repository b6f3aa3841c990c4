pub mod input;
pub mod logging;

use log::{error, info};
use synthcase::summary::{self, MonthlyTotal, YearlyTotal};
use synthcase::{
    CalendarAdjustment, DiseaseTable, Environment, Error, SimulationRequest, Simulator,
};

use input::RunInput;

fn run(ctx: &Environment<RunInput>, input: &RunInput) -> Result<(), Error> {
    let table = DiseaseTable::from_path(ctx.file("assumptions")?)?;
    let request = SimulationRequest::new(
        &input.location,
        input.start_date,
        input.end_date,
        ctx.seed,
    )?;

    // Run simulation
    let calendar = CalendarAdjustment::with_feasts(table.feasts().clone());
    let records = Simulator::new(&table, calendar).simulate(&request)?;

    for record in summary::preview(&records, input.preview_rows) {
        info!(
            "{} {} {}: {}",
            record.date_string(),
            record.location(),
            record.diagnosis(),
            record.count()
        );
    }

    ctx.write_records("cases.csv", &records)?;

    // Period totals only go to a filesystem target; stdout carries the cases
    if ctx.output_dir().is_some() {
        let monthly: Vec<MonthlyTotal> = table
            .keys()
            .flat_map(|key| summary::monthly_totals(&records, key))
            .collect();
        let yearly: Vec<YearlyTotal> = table
            .keys()
            .flat_map(|key| summary::yearly_totals(&records, key))
            .collect();
        ctx.write_records("monthly_totals.csv", &monthly)?;
        ctx.write_records("yearly_totals.csv", &yearly)?;
    }
    Ok(())
}

fn main() {
    let ctx = match Environment::<RunInput>::load() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let Some(input) = ctx.input.as_ref() else {
        eprintln!("Error: missing model input");
        std::process::exit(1);
    };

    if let Err(e) = logging::init(logging::level(input.log_level.as_deref())) {
        eprintln!("Error: failed to initialize logging: {e}");
    }

    if let Err(e) = run(&ctx, input) {
        error!("{e}");
        std::process::exit(1);
    }
}
