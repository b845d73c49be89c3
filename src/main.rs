#[macro_use]
extern crate clap;
extern crate cpt;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate rand;

use std::path::PathBuf;
use std::process;

use clap::{App, AppSettings, Arg, ArgMatches};
use rand::rngs::StdRng;
use rand::SeedableRng;

use cpt::synthetic::{self, SyntheticSpec};
use cpt::{Config, Corpus, CorpusAdapter, GibbsSampler, Model};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("cpt")
        .version(crate_version!())
        .about("Cross-perspective topic model estimated by collapsed Gibbs sampling")
        .arg(Arg::with_name("topics")
             .long("topics")
             .takes_value(true)
             .value_name("NUMBER")
             .help("Set the number of topics"))
        .arg(Arg::with_name("iterations")
             .long("iterations")
             .takes_value(true)
             .value_name("NUMBER")
             .help("Set the number of sampled sweeps that are averaged"))
        .arg(Arg::with_name("burn-in")
             .long("burn-in")
             .takes_value(true)
             .value_name("NUMBER")
             .help("Set the number of sweeps discarded before sampling"))
        .arg(Arg::with_name("alpha")
             .long("alpha")
             .takes_value(true)
             .value_name("PRIOR")
             .help("Set the document-topic prior"))
        .arg(Arg::with_name("beta")
             .long("beta")
             .takes_value(true)
             .value_name("PRIOR")
             .help("Set the topic-word prior"))
        .arg(Arg::with_name("beta-o")
             .long("beta-o")
             .takes_value(true)
             .value_name("PRIOR")
             .help("Set the opinion-word prior"))
        .arg(Arg::with_name("seed")
             .long("seed")
             .takes_value(true)
             .value_name("NUMBER")
             .help("Seed the random number generator"))
        .arg(Arg::with_name("out-dir")
             .long("out-dir")
             .takes_value(true)
             .value_name("DIR")
             .help("Persist per-iteration parameter samples under DIR instead of keeping them in memory"))
        .arg(Arg::with_name("config")
             .long("config")
             .takes_value(true)
             .value_name("CONFIG-FILE")
             .help("Read sampler settings from a JSON file; flags override it"))
        .arg(Arg::with_name("model")
             .long("model")
             .takes_value(true)
             .value_name("MODEL-FILE")
             .help("Write the estimated model as JSON"))
        .arg(Arg::with_name("top")
             .long("top")
             .takes_value(true)
             .value_name("NUMBER")
             .default_value("10")
             .help("Set the number of words printed per topic and opinion"))
        .arg(Arg::with_name("test-dataset")
             .long("test-dataset")
             .help("Run with an automatically generated dataset"))
        .arg(Arg::with_name("INPUT")
             .help("Sets the corpus directory (one sub-directory per perspective)")
             .required(false)
             .index(1))
        .setting(AppSettings::ArgRequiredElseHelp)
        .get_matches();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> cpt::Result<()> {
    let mut config = match matches.value_of("config") {
        Some(fp) => Config::from_json_file(fp)?,
        None     => Config::default(),
    };
    if matches.is_present("topics") {
        config.num_topics = value_t_or_exit!(matches, "topics", usize);
    }
    if matches.is_present("iterations") {
        config.num_iterations = value_t_or_exit!(matches, "iterations", usize);
    }
    if matches.is_present("burn-in") {
        config.burn_in = value_t_or_exit!(matches, "burn-in", usize);
    }
    if matches.is_present("alpha") {
        config.alpha = value_t_or_exit!(matches, "alpha", f64);
    }
    if matches.is_present("beta") {
        config.beta = value_t_or_exit!(matches, "beta", f64);
    }
    if matches.is_present("beta-o") {
        config.beta_o = value_t_or_exit!(matches, "beta-o", f64);
    }
    if matches.is_present("seed") {
        config.seed = Some(value_t_or_exit!(matches, "seed", u64));
    }
    if let Some(dir) = matches.value_of("out-dir") {
        config.out_dir = Some(PathBuf::from(dir));
    }
    let top = value_t_or_exit!(matches, "top", usize);

    let corpus = if matches.is_present("test-dataset") {
        info!("Generating a dataset...");
        let spec = SyntheticSpec { num_topics: config.num_topics, ..SyntheticSpec::default() };
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        synthetic::generate(&spec, &mut rng)?.corpus
    }
    else if let Some(input_fp) = matches.value_of("INPUT") {
        Corpus::from_dir(input_fp)?
    }
    else {
        error!("Either INPUT or --test-dataset is required");
        process::exit(2);
    };
    info!("Corpus: {} documents, {} perspectives, {} topic words, {} opinion words",
          corpus.num_documents(), corpus.num_perspectives(),
          corpus.topic_vocab_size(), corpus.opinion_vocab_size());

    let model = GibbsSampler::new(&corpus, config)?.run()?;
    report(&model, &corpus, top)?;

    if let Some(fp) = matches.value_of("model") {
        model.save_json(fp)?;
        info!("Model written to {}", fp);
    }
    Ok(())
}

fn report(model: &Model, corpus: &Corpus, top: usize) -> cpt::Result<()> {
    let topic_vocab = corpus.topic_vocab();
    let opinion_vocab = corpus.opinion_vocab();
    model.print_topics_and_opinions_by(top, |v| &topic_vocab[v], |v| &opinion_vocab[v])?;
    Ok(())
}
