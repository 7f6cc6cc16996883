use game_night_board::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() {
    match ApiDoc::openapi().to_pretty_json() {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to serialize the OpenAPI document: {err}");
            std::process::exit(1);
        }
    }
}
