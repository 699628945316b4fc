use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use katsuyou_rs::analyzer::TokenizerHandle;
use katsuyou_rs::config::Config;
use katsuyou_rs::conjugator::{Conjugator, StudySession};
use katsuyou_rs::furigana::{to_inline, FuriganaAnnotator};
use katsuyou_rs::lexicon::{CategoryFilter, WordClass};
use katsuyou_rs::resolver::LookupError;
use katsuyou_rs::rules;

#[derive(Parser)]
#[command(name = "katsuyou", about = "Japanese verb and adjective conjugation tables")]
struct Cli {
    /// Configuration file (default: ./katsuyou.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List lemmas with furigana
    List {
        class: ClassArg,
        /// "all" or a category of the word class
        #[arg(long, default_value = "all")]
        category: String,
    },
    /// Show the conjugation table for a lemma
    Show {
        class: ClassArg,
        lemma: String,
        /// Category passed on when the table has to be generated
        #[arg(long)]
        category: Option<String>,
        /// Show hidden cells
        #[arg(long)]
        reveal: bool,
    },
    /// Annotate text with furigana
    Furigana { text: String },
    /// Print the ta-form and te-form rules
    Rules,
}

#[derive(Clone, Copy, ValueEnum)]
enum ClassArg {
    Verb,
    Adjective,
}

impl From<ClassArg> for WordClass {
    fn from(arg: ClassArg) -> Self {
        match arg {
            ClassArg::Verb => WordClass::Verb,
            ClassArg::Adjective => WordClass::Adjective,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => Config::load_from_default(),
    };

    if let Command::Rules = cli.command {
        print_rules();
        return Ok(());
    }

    let tokenizer = TokenizerHandle::pending();
    if let Err(e) = tokenizer.spawn_ipadic().await {
        tracing::error!("Tokenizer initialization task failed: {}", e);
    }

    match cli.command {
        Command::List { class, category } => {
            let class = WordClass::from(class);
            let conjugator = Conjugator::from_config(&config, class, tokenizer);
            let mut session = StudySession::new(class);
            session.category = CategoryFilter::parse(class, &category)?;

            for entry in session.visible(conjugator.lexicon()) {
                let text = to_inline(&conjugator.annotator().annotate(&entry.text));
                println!("{:>4}  {}  ({})", entry.id, text, entry.category);
            }
        }
        Command::Show {
            class,
            lemma,
            category,
            reveal,
        } => {
            let class = WordClass::from(class);
            let mut conjugator = Conjugator::from_config(&config, class, tokenizer);

            match conjugator.conjugate(&lemma, category.as_deref()).await {
                Ok((record, source)) => {
                    tracing::debug!("{} from {:?}", lemma, source);
                    let mut view = conjugator.view(&record);
                    if reveal {
                        view.reveal_all();
                    }
                    print!("{}", view.render_text());
                }
                Err(LookupError::NotFound(lemma)) => {
                    println!("No data for 「{}」", lemma);
                }
                Err(LookupError::EmptyInput) => {
                    println!("Enter a Japanese {}", class);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Furigana { text } => {
            let annotator = FuriganaAnnotator::new(tokenizer);
            println!("{}", to_inline(&annotator.annotate(&text)));
        }
        Command::Rules => print_rules(),
    }

    Ok(())
}

fn print_rules() {
    println!("Ending\tTa-form\tTe-form");
    for (endings, ta, te) in rules::table() {
        println!("{}\t{}\t{}", endings, ta, te);
    }
    println!("*Exception: いく → いった");
}
