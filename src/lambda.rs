use csv2json_etl::domain::model::ObjectReport;
use csv2json_etl::utils::{logger, validation::Validate};
use csv2json_etl::{
    build_s3_client, BatchCoordinator, ConvertConfig, S3Event, S3Settings, S3Storage,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Serialize;

#[derive(Serialize)]
pub struct Response {
    pub message: String,
    pub objects_uploaded: usize,
    pub objects_failed: usize,
    pub objects_skipped: usize,
    pub records_processed: usize,
    pub objects: Vec<ObjectReport>,
}

async fn function_handler(
    coordinator: &BatchCoordinator<S3Storage, ConvertConfig>,
    event: LambdaEvent<S3Event>,
) -> Result<Response, Error> {
    let objects = event.payload.object_refs();
    tracing::info!(
        "Received {} object notifications (request {})",
        objects.len(),
        event.context.request_id
    );

    let summary = coordinator.run(&objects).await;

    Ok(Response {
        message: "CSV files processed".to_string(),
        objects_uploaded: summary.uploaded(),
        objects_failed: summary.failed(),
        objects_skipped: summary.skipped,
        records_processed: summary.records_processed(),
        objects: summary.objects,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 啟動時載入並驗證配置
    let config = ConvertConfig::from_env()?;
    config.validate()?;
    let settings = S3Settings::from_env();
    settings.validate()?;

    let client = build_s3_client(&settings).await;
    let coordinator = BatchCoordinator::new(S3Storage::new(client), config);
    let coordinator = &coordinator;

    run(service_fn(move |event: LambdaEvent<S3Event>| async move {
        function_handler(coordinator, event).await
    }))
    .await
}
