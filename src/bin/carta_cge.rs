//! Generate CGE customer-response letters from DOCX templates.
//!
//! Usage:
//!   carta-cge generate --tipo error_lectura --tratamiento Señor \
//!     --nombre "Eduardo López" --direccion "Prat 725" --comuna Valparaíso \
//!     --numero-cliente 6255126 --reclamo 15624563 --zona Centro \
//!     --canal "Call Center" [--anexo tabla.tsv]
//!   carta-cge check-templates

use anyhow::{Context, Result};
use carta_cge::annex::AnnexDataset;
use carta_cge::format::group_thousands;
use carta_cge::generate::TemplateStatus;
use carta_cge::letter::{GeneralFields, ReadingErrorFields};
use carta_cge::{Channel, ExternalCase, Generator, GeneratorConfig, LetterForm, LetterKind, Zone};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "carta-cge", about = "Generate customer-response letters from DOCX templates")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "CARTA_CGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a template and write the letter to the output directory
    Generate(GenerateArgs),

    /// Check that every letter template exists and report missing placeholders
    CheckTemplates,
}

#[derive(Args)]
struct GenerateArgs {
    /// Letter type (error_lectura, respuesta_general)
    #[arg(long, default_value = "error_lectura")]
    tipo: String,

    /// Issue city for the date line (defaults to the configured city)
    #[arg(long, default_value = "")]
    ciudad: String,

    /// Salutation: Señor / Señora
    #[arg(long, default_value = "Señor")]
    tratamiento: String,

    /// Client full name
    #[arg(long, default_value = "")]
    nombre: String,

    #[arg(long, default_value = "")]
    direccion: String,

    #[arg(long, default_value = "")]
    comuna: String,

    #[arg(long, default_value = "")]
    numero_cliente: String,

    /// Internal claim number (GR)
    #[arg(long, default_value = "")]
    reclamo: String,

    /// Zone: Norte, Centro, Sur
    #[arg(long, default_value = "Centro")]
    zona: String,

    /// Intake channel (e.g. "Call Center", "Oficina Comercial", "Portal SEC")
    #[arg(long, default_value = "Oficina Comercial")]
    canal: String,

    #[arg(long)]
    dgr: Option<String>,

    /// External regulator case type (e.g. SEC); used with --caso-numero
    #[arg(long, default_value = "SEC")]
    caso_tipo: String,

    /// External regulator case number
    #[arg(long)]
    caso_numero: Option<String>,

    /// boleta / factura
    #[arg(long)]
    documento: Option<String>,

    /// New bill date (dd/mm/aaaa)
    #[arg(long)]
    fecha_boleta: Option<String>,

    /// Corrected consumption in kWh
    #[arg(long)]
    consumo: Option<String>,

    /// Bill amount
    #[arg(long)]
    monto: Option<String>,

    /// Reading-day range
    #[arg(long, default_value = "06 y 12")]
    rango_lectura: Option<String>,

    /// Response text for general letters
    #[arg(long)]
    respuesta: Option<String>,

    /// Tab-separated annex table (pasted from a spreadsheet)
    #[arg(long)]
    anexo: Option<PathBuf>,

    /// Print the text of the generated letter
    #[arg(long)]
    preview: bool,
}

fn build_form(args: &GenerateArgs) -> Result<LetterForm> {
    let kind = match LetterKind::from_id(&args.tipo)? {
        LetterKind::ReadingError(_) => LetterKind::ReadingError(ReadingErrorFields {
            document_kind: args.documento.clone(),
            bill_date: args.fecha_boleta.clone(),
            corrected_kwh: args.consumo.as_deref().map(group_thousands),
            amount: args.monto.as_deref().map(group_thousands),
            reading_range: args.rango_lectura.clone(),
        }),
        LetterKind::General(_) => LetterKind::General(GeneralFields {
            response_body: args.respuesta.clone(),
        }),
    };

    Ok(LetterForm {
        kind,
        issue_city: args.ciudad.clone(),
        salutation: args.tratamiento.clone(),
        client_name: args.nombre.clone(),
        address: args.direccion.clone(),
        commune: args.comuna.clone(),
        client_number: args.numero_cliente.clone(),
        claim_number: args.reclamo.clone(),
        zone: args.zona.parse::<Zone>()?,
        channel: args.canal.parse::<Channel>()?,
        dgr_number: args.dgr.clone(),
        external_case: args.caso_numero.as_ref().map(|number| ExternalCase {
            kind: args.caso_tipo.clone(),
            number: number.clone(),
        }),
    })
}

fn generate(generator: &Generator, args: &GenerateArgs) -> Result<()> {
    let form = build_form(args)?;

    let annex = match &args.anexo {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read annex: {}", path.display()))?;
            AnnexDataset::parse_tsv(&text)?
        }
        None => None,
    };
    if let Some(ref data) = annex {
        println!(
            "Annex: {} columns, {} rows",
            data.columns().len(),
            data.rows().len()
        );
    }

    let letter = generator.generate(&form, annex.as_ref())?;
    println!(
        "Rewrote {} of {} paragraphs ({} bold)",
        letter.stats.rewritten, letter.stats.visited, letter.stats.bold
    );
    if letter.annex_rows > 0 {
        println!("Appended annex with {} rows", letter.annex_rows);
    }
    for placeholder in &letter.leftover {
        println!("  Left unfilled: {}", placeholder);
    }
    if args.preview {
        println!("\n{}\n", letter.preview);
    }
    println!("Saved to: {}", letter.path.display());
    Ok(())
}

fn check_templates(generator: &Generator) -> bool {
    let mut ok = true;
    for report in generator.check_templates() {
        match report.status {
            TemplateStatus::Missing => {
                ok = false;
                println!("{}: MISSING ({})", report.kind_id, report.path.display());
            }
            TemplateStatus::Unreadable(reason) => {
                ok = false;
                println!("{}: UNREADABLE ({})", report.kind_id, reason);
            }
            TemplateStatus::Checked { missing_slots } if missing_slots.is_empty() => {
                println!("{}: ok", report.kind_id);
            }
            TemplateStatus::Checked { missing_slots } => {
                println!(
                    "{}: ok, no placeholder for {}",
                    report.kind_id,
                    missing_slots.join(", ")
                );
            }
        }
    }
    ok
}

fn run(cli: Cli) -> Result<bool> {
    let config = GeneratorConfig::load(cli.config.as_deref())?;
    let generator = Generator::new(config);
    match cli.command {
        Commands::Generate(args) => generate(&generator, &args).map(|_| true),
        Commands::CheckTemplates => Ok(check_templates(&generator)),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            match e.downcast_ref::<carta_cge::LetterError>() {
                Some(err) if err.is_precondition() => eprintln!("Error: {}", err),
                _ => eprintln!("Letter generation failed: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
