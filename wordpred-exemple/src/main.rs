use std::path::Path;

use wordpred_core::model::evaluation::{evaluate, split_train_test};
use wordpred_core::model::generator::join_tokens;
use wordpred_core::{PredictorConfig, WordPredictor, list_files};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Order 2, case-insensitive, room for 65536 distinct words
    let config = PredictorConfig::new(2, false, 65_536)?;
    let mut predictor = WordPredictor::new(config)?;

    // Every .dat file in "./data" is a corpus, one text per line
    let data = Path::new("./data");
    let files = list_files(data, "dat")?;
    if files.is_empty() {
        println!("No corpus found in {}", data.display());
        return Ok(());
    }

    // Train on the first 75% of the files, keep the rest for evaluation
    let (train, test) = split_train_test(&files, 0.75);
    log::info!("Training on {} files, evaluating on {}", train.len(), test.len());
    for file in train {
        let text = std::fs::read_to_string(data.join(file))?;
        let learned = predictor.learn(&text);
        log::info!("Learned {} tokens from {}", learned, file);
    }

    let stats = predictor.stats();
    println!(
        "Model: {} terms, {} states, {} cells, {} observations",
        stats.terms, stats.states, stats.cells, stats.observations
    );

    // A prediction counts as correct if the actual word is in the top 3
    let mut texts = Vec::new();
    for file in test {
        texts.push(std::fs::read_to_string(data.join(file))?);
    }
    let evaluation = evaluate(&predictor, &texts, 3);
    println!(
        "Top-3 accuracy: {} / {} ({:.2}%)",
        evaluation.correct,
        evaluation.total,
        evaluation.accuracy() * 100.0
    );

    // Ranked candidates, then only those starting with "th".
    // Filtered probabilities are not renormalized.
    for phrase in ["I am", "it is", "the"] {
        let candidates = predictor.predict(phrase);
        println!("'{}' ->", phrase);
        for candidate in candidates.top(5) {
            println!("    {}: {:.4}", candidate.term, candidate.probability);
        }
        for (term, probability) in candidates.terms("th").into_iter().take(3) {
            println!("    [th] {}: {:.4}", term, probability);
        }
    }

    // Let the chain run on its own for a while
    let mut rng = rand::rng();
    for seed in ["It was", "The"] {
        let words = predictor.generate(seed, 25, &mut rng);
        println!("{} {}", seed, join_tokens(&words));
    }

    Ok(())
}
