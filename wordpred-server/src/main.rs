use std::path::{Path, PathBuf};
use std::sync::RwLock;

use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, put, web};

use serde::Deserialize;
use wordpred_core::config::{self, env_key, env_string};
use wordpred_core::{PredictorConfig, WordPredictor, list_files};

const DEFAULT_BIND: &str = "127.0.0.1:5000";
const DEFAULT_DATA_DIR: &str = "./data";

/// Query parameters of `/v1/predict`
#[derive(Deserialize)]
struct PredictParams {
	phrase: Option<String>,
	prefix: Option<String>,
	limit: Option<usize>,
}

#[derive(Deserialize)]
struct ModelQuery {
	name: Option<String>,
}

struct SharedData {
	predictor: WordPredictor,
	config: PredictorConfig,
	data_dir: PathBuf,
}

impl SharedData {
	fn new(config: PredictorConfig, data_dir: PathBuf) -> Result<Self, String> {
		let predictor = WordPredictor::new(config).map_err(|e| e.to_string())?;
		Ok(Self { predictor, config, data_dir })
	}
}

impl ModelQuery {
	/// Model name, restricted to letters, digits, `-` and `_` so it cannot leave the data dir.
	fn name(&self) -> Result<&str, String> {
		match &self.name {
			Some(s) if !s.trim().is_empty() => {
				let name = s.trim();
				if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
					Ok(name)
				} else {
					Err(format!("Invalid model name: {name}"))
				}
			}
			_ => Err("Missing or empty model name".to_owned()),
		}
	}
}

/// HTTP GET endpoint `/v1/predict`
///
/// Returns the ranked candidates following `phrase` as a JSON array of
/// `{term, probability}`, optionally narrowed to terms starting with
/// `prefix` and truncated to `limit` entries.
#[get("/v1/predict")]
async fn get_predict(data: web::Data<RwLock<SharedData>>, query: web::Query<PredictParams>) -> impl Responder {
	let Some(phrase) = &query.phrase else {
		return HttpResponse::BadRequest().body("Missing phrase");
	};

	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let candidates = shared_data.predictor.predict(phrase);
	let mut filtered = candidates.filtered(query.prefix.as_deref().unwrap_or_default());
	if let Some(limit) = query.limit {
		filtered.truncate(limit);
	}
	HttpResponse::Ok().json(filtered)
}

/// HTTP PUT endpoint `/v1/learn`
///
/// Learns from the request body; responds with the number of tokens learned.
#[put("/v1/learn")]
async fn put_learn(data: web::Data<RwLock<SharedData>>, body: String) -> impl Responder {
	let mut shared_data = match data.write() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let learned = shared_data.predictor.learn(&body);
	HttpResponse::Ok().body(learned.to_string())
}

#[get("/v1/stats")]
async fn get_stats(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().json(shared_data.predictor.stats())
}

#[get("/v1/models")]
async fn get_models(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let data_dir = match data.read() {
		Ok(m) => m.data_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match list_files(&data_dir, "dat") {
		Ok(files) => HttpResponse::Ok().body(model_names(&files).join("\n")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list models"),
	}
}

/// Corpus file names without their extension; only the final `.dat` goes.
fn model_names(files: &[String]) -> Vec<String> {
	files
		.iter()
		.filter_map(|file| Path::new(file).file_stem())
		.map(|stem| stem.to_string_lossy().into_owned())
		.collect()
}

/// HTTP PUT endpoint `/v1/load_model`
///
/// Replaces the current predictor with one trained on `<data>/<name>.dat`
/// (or its cached `.bin`).
#[put("/v1/load_model")]
async fn put_load_model(data: web::Data<RwLock<SharedData>>, query: web::Query<ModelQuery>) -> impl Responder {
	let name = match query.name() {
		Ok(name) => name,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	let (config, path) = match data.read() {
		Ok(m) => (m.config, m.data_dir.join(format!("{name}.dat"))),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	if !path.is_file() {
		return HttpResponse::NotFound().body(format!("Unknown model: {name}"));
	}

	// Train outside the lock so predictions keep being served meanwhile
	let predictor = match WordPredictor::from_corpus(&path, config) {
		Ok(p) => p,
		Err(e) => return HttpResponse::InternalServerError().body(format!("Failed to load model: {e}")),
	};

	match data.write() {
		Ok(mut m) => m.predictor = predictor,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	}
	log::info!("Loaded model {name}");
	HttpResponse::Ok().body("Model loaded successfully")
}

/// HTTP PUT endpoint `/v1/save`
///
/// Writes the current predictor to `<data>/<name>.bin`.
#[put("/v1/save")]
async fn put_save(data: web::Data<RwLock<SharedData>>, query: web::Query<ModelQuery>) -> impl Responder {
	let name = match query.name() {
		Ok(name) => name,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let path = shared_data.data_dir.join(format!("{name}.bin"));
	match shared_data.predictor.save(&path) {
		Ok(()) => HttpResponse::Ok().body("Model saved successfully"),
		Err(e) => HttpResponse::InternalServerError().body(format!("Failed to save model: {e}")),
	}
}

fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(get_predict)
		.service(put_learn)
		.service(get_stats)
		.service(get_models)
		.service(put_load_model)
		.service(put_save);
}

/// Main entry point for the server.
///
/// Reads the predictor configuration from `WORDPRED_*` variables, wraps an
/// empty predictor in an `RwLock` (learning writes, predictions read) and
/// serves it on `WORDPRED_BIND`.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();

	let config = config::from_env().map_err(std::io::Error::other)?;
	let bind = env_string(&env_key("BIND"))
		.map_err(std::io::Error::other)?
		.unwrap_or_else(|| DEFAULT_BIND.to_owned());
	let data_dir = env_string(&env_key("DATA_DIR"))
		.map_err(std::io::Error::other)?
		.map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

	log::info!(
		"Serving order {} predictor (case sensitive: {}, vocab size: {}) on {bind}",
		config.order,
		config.case_sensitive,
		config.vocab_size
	);
	let shared_data = SharedData::new(config, data_dir).map_err(std::io::Error::other)?;
	let shared_model = web::Data::new(RwLock::new(shared_data));

	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.app_data(shared_model.clone())
			.configure(routes)
	})
	.bind(bind)?
	.run()
	.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;
	use wordpred_core::Candidate;

	fn shared(data_dir: PathBuf) -> web::Data<RwLock<SharedData>> {
		let config = PredictorConfig::new(1, true, 100).unwrap();
		web::Data::new(RwLock::new(SharedData::new(config, data_dir).unwrap()))
	}

	#[actix_web::test]
	async fn learn_then_predict() {
		let app = test::init_service(App::new().app_data(shared(PathBuf::from("."))).configure(routes)).await;

		let req = test::TestRequest::put().uri("/v1/learn").set_payload("the cat. the dog.").to_request();
		let body = test::call_and_read_body(&app, req).await;
		assert_eq!(&body[..], b"6");

		let req = test::TestRequest::get().uri("/v1/predict?phrase=the").to_request();
		let candidates: Vec<Candidate> = test::call_and_read_body_json(&app, req).await;
		assert_eq!(
			candidates,
			vec![
				Candidate { term: "cat".to_owned(), probability: 0.5 },
				Candidate { term: "dog".to_owned(), probability: 0.5 },
			]
		);

		let req = test::TestRequest::get().uri("/v1/predict?phrase=the&prefix=d").to_request();
		let candidates: Vec<Candidate> = test::call_and_read_body_json(&app, req).await;
		assert_eq!(candidates, vec![Candidate { term: "dog".to_owned(), probability: 0.5 }]);

		let req = test::TestRequest::get().uri("/v1/predict?phrase=the&limit=1").to_request();
		let candidates: Vec<Candidate> = test::call_and_read_body_json(&app, req).await;
		assert_eq!(candidates.len(), 1);
		assert_eq!(candidates[0].term, "cat");
	}

	#[actix_web::test]
	async fn missing_phrase_is_rejected() {
		let app = test::init_service(App::new().app_data(shared(PathBuf::from("."))).configure(routes)).await;
		let req = test::TestRequest::get().uri("/v1/predict").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn invalid_model_names_are_rejected() {
		let app = test::init_service(App::new().app_data(shared(PathBuf::from("."))).configure(routes)).await;
		let req = test::TestRequest::put().uri("/v1/load_model?name=..%2Fsecret").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put().uri("/v1/save").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn loads_models_from_data_dir() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("tiny.dat"), "a b\na c\n").unwrap();

		let app = test::init_service(App::new().app_data(shared(dir.path().to_path_buf())).configure(routes)).await;

		let req = test::TestRequest::get().uri("/v1/models").to_request();
		assert_eq!(&test::call_and_read_body(&app, req).await[..], b"tiny");

		let req = test::TestRequest::put().uri("/v1/load_model?name=missing").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

		let req = test::TestRequest::put().uri("/v1/load_model?name=tiny").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

		let req = test::TestRequest::get().uri("/v1/predict?phrase=a").to_request();
		let candidates: Vec<Candidate> = test::call_and_read_body_json(&app, req).await;
		assert_eq!(candidates.len(), 2);

		let req = test::TestRequest::put().uri("/v1/save?name=copy").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
		assert!(dir.path().join("copy.bin").exists());
	}

	#[actix_web::test]
	async fn model_listing_strips_only_the_extension() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("old.data.dat"), "a b\n").unwrap();
		std::fs::write(dir.path().join("tiny.dat"), "a b\n").unwrap();

		let app = test::init_service(App::new().app_data(shared(dir.path().to_path_buf())).configure(routes)).await;
		let req = test::TestRequest::get().uri("/v1/models").to_request();
		assert_eq!(&test::call_and_read_body(&app, req).await[..], b"old.data\ntiny");
	}

	#[actix_web::test]
	async fn model_names_keep_inner_dots() {
		let files = vec!["a.dat.dat".to_owned(), "update.dat".to_owned()];
		assert_eq!(model_names(&files), vec!["a.dat", "update"]);
	}
}
