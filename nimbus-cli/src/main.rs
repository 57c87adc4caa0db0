mod config;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use nimbus_core::provider::{Provider, ResourceType};
use nimbus_core::resource::{Resource, ResourceId};
use nimbus_core::schema::ResourceSchema;
use nimbus_provider_nirmata::{ClientConfig, NirmataProvider};
use nimbus_state::{LocalBackend, ResourceState, StateBackend, StateFile};

use crate::config::load_resources;

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(about = "Manage Nirmata cluster types from declarative configuration", long_about = None)]
struct Cli {
    /// Path to the state file
    #[arg(long, global = true, default_value = LocalBackend::DEFAULT_STATE_FILE)]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Connection {
    /// Nirmata base URL
    #[arg(long, env = "NIRMATA_URL")]
    url: String,

    /// Nirmata API token
    #[arg(long, env = "NIRMATA_TOKEN", hide_env_values = true)]
    token: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "NIRMATA_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file
    Validate {
        /// Path to the configuration file
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Create every resource that is not yet in the state
    Apply {
        /// Path to the configuration file
        #[arg(default_value = "main.json")]
        file: PathBuf,

        #[command(flatten)]
        connection: Connection,
    },
    /// Destroy all resources recorded in the state
    Destroy {
        /// Path to the configuration file
        #[arg(default_value = "main.json")]
        file: PathBuf,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,

        #[command(flatten)]
        connection: Connection,
    },
    /// Record an existing backend object as a configured resource
    Import {
        /// Path to the configuration file
        file: PathBuf,

        /// Local name of the resource in the configuration
        name: String,

        /// Backend id of the existing object
        identifier: String,

        #[command(flatten)]
        connection: Connection,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let backend = LocalBackend::with_path(cli.state);

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Apply { file, connection } => run_apply(&file, &connection, &backend).await,
        Commands::Destroy {
            file,
            auto_approve,
            connection,
        } => run_destroy(&file, auto_approve, &connection, &backend).await,
        Commands::Import {
            file,
            name,
            identifier,
            connection,
        } => run_import(&file, &name, &identifier, &connection, &backend).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn get_provider(connection: &Connection) -> Result<NirmataProvider, String> {
    let config = ClientConfig::new(&connection.url, &connection.token)
        .with_timeout(Duration::from_secs(connection.timeout_secs));
    NirmataProvider::connect(config).map_err(|e| format!("Failed to create client: {}", e))
}

fn get_resource_types() -> HashMap<&'static str, Box<dyn ResourceType>> {
    nimbus_provider_nirmata::resource_types()
        .into_iter()
        .map(|t| (t.name(), t))
        .collect()
}

fn validate_resources(resources: &[Resource]) -> Result<(), String> {
    let types = get_resource_types();
    let mut all_errors = Vec::new();

    for resource in resources {
        let Some(resource_type) = types.get(resource.id.resource_type.as_str()) else {
            all_errors.push(format!("{}: unknown resource type", resource.id));
            continue;
        };

        let schema: ResourceSchema = resource_type.schema();
        if let Err(errors) = schema.validate(&resource.attributes) {
            for error in errors {
                all_errors.push(format!("{}: {}", resource.id, error));
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors.join("\n"))
    }
}

fn run_validate(file: &Path) -> Result<(), String> {
    let resources = load_resources(file)?;
    validate_resources(&resources)?;

    println!(
        "{}",
        format!("Configuration is valid. {} resource(s).", resources.len()).green()
    );
    Ok(())
}

async fn read_state(backend: &LocalBackend) -> Result<StateFile, String> {
    backend
        .read_state()
        .await
        .map(Option::unwrap_or_default)
        .map_err(|e| format!("Failed to read state: {}", e))
}

async fn save_state(backend: &LocalBackend, state: &mut StateFile) -> Result<(), String> {
    state.increment_serial();
    backend
        .write_state(state)
        .await
        .map_err(|e| format!("Failed to write state: {}", e))
}

fn create_timeout(id: &ResourceId) -> Option<Duration> {
    get_resource_types()
        .get(id.resource_type.as_str())
        .and_then(|t| t.create_timeout())
}

async fn create_with_timeout(
    provider: &NirmataProvider,
    resource: &Resource,
    timeout: Option<Duration>,
) -> Result<String, String> {
    let created = match timeout {
        Some(limit) => tokio::time::timeout(limit, provider.create(resource))
            .await
            .map_err(|_| format!("timed out after {:?}", limit))?,
        None => provider.create(resource).await,
    }
    .map_err(|e| e.to_string())?;

    created
        .identifier
        .ok_or_else(|| "provider returned no identifier".to_string())
}

async fn run_apply(
    file: &Path,
    connection: &Connection,
    backend: &LocalBackend,
) -> Result<(), String> {
    let resources = load_resources(file)?;
    validate_resources(&resources)?;

    let provider = get_provider(connection)?;
    let mut state = read_state(backend).await?;

    let mut success_count = 0;
    let mut failure_count = 0;

    for resource in &resources {
        let id = &resource.id;
        let known = state
            .identifier(&id.resource_type, &id.name)
            .map(str::to_string);

        if let Some(identifier) = known {
            let current = provider
                .read(id, Some(identifier.as_str()))
                .await
                .map_err(|e| format!("Failed to read {}: {}", id, e))?;
            log::debug!("{} exists: {}", id, current.exists);
            println!("  {} {} ({})", "=".dimmed(), id, identifier);
            continue;
        }

        match create_with_timeout(&provider, resource, create_timeout(id)).await {
            Ok(identifier) => {
                println!("  {} {} ({})", "✓".green(), id, identifier);
                state.upsert_resource(ResourceState::new(
                    &id.resource_type,
                    &id.name,
                    provider.name(),
                    identifier,
                ));
                save_state(backend, &mut state).await?;
                success_count += 1;
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), id, e);
                failure_count += 1;
            }
        }
    }

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Apply complete! {} resource(s) created.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Apply failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

fn confirm_destroy() -> Result<bool, String> {
    println!(
        "{}",
        "Do you really want to destroy all resources?"
            .yellow()
            .bold()
    );
    println!(
        "  {}",
        "This action cannot be undone. Type 'yes' to confirm.".yellow()
    );
    print!("\n  Enter a value: ");
    std::io::Write::flush(&mut std::io::stdout()).map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;
    println!();

    Ok(input.trim() == "yes")
}

async fn run_destroy(
    file: &Path,
    auto_approve: bool,
    connection: &Connection,
    backend: &LocalBackend,
) -> Result<(), String> {
    let resources = load_resources(file)?;
    let mut state = read_state(backend).await?;

    // Reverse declaration order
    let to_destroy: Vec<(ResourceId, String)> = resources
        .iter()
        .rev()
        .filter_map(|r| {
            state
                .identifier(&r.id.resource_type, &r.id.name)
                .map(|identifier| (r.id.clone(), identifier.to_string()))
        })
        .collect();

    if to_destroy.is_empty() {
        println!("{}", "No resources to destroy.".green());
        return Ok(());
    }

    println!("{}", "Destroy Plan:".red().bold());
    println!();
    for (id, identifier) in &to_destroy {
        println!("  {} {} ({})", "-".red().bold(), id, identifier);
    }
    println!();

    if !auto_approve && !confirm_destroy()? {
        println!("{}", "Destroy cancelled.".yellow());
        return Ok(());
    }

    let provider = get_provider(connection)?;

    let mut success_count = 0;
    let mut failure_count = 0;

    for (id, identifier) in &to_destroy {
        match provider.delete(id, identifier).await {
            Ok(()) => {
                println!("  {} {}", "✓".green(), id);
                state.remove_resource(&id.resource_type, &id.name);
                save_state(backend, &mut state).await?;
                success_count += 1;
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), id, e);
                failure_count += 1;
            }
        }
    }

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Destroy complete! {} resource(s) destroyed.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Destroy failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

async fn run_import(
    file: &Path,
    name: &str,
    identifier: &str,
    connection: &Connection,
    backend: &LocalBackend,
) -> Result<(), String> {
    let resources = load_resources(file)?;
    let resource = resources
        .iter()
        .find(|r| r.id.name == name)
        .ok_or_else(|| format!("No resource named '{}' in {}", name, file.display()))?;

    let provider = get_provider(connection)?;
    let imported = provider
        .import(&resource.id, identifier)
        .await
        .map_err(|e| format!("Failed to import {}: {}", resource.id, e))?;
    let identifier = imported
        .identifier
        .ok_or_else(|| format!("Import of {} returned no identifier", resource.id))?;

    let mut state = read_state(backend).await?;
    state.upsert_resource(ResourceState::new(
        &resource.id.resource_type,
        &resource.id.name,
        provider.name(),
        &identifier,
    ));
    save_state(backend, &mut state).await?;

    println!(
        "{}",
        format!("Imported {} as {}.", resource.id, identifier).green()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_core::resource::Value;
    use wiremock::matchers::{any, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CONFIG: &str = r#"{
        "resources": [
            {
                "type": "eks_cluster_type",
                "name": "main",
                "attributes": {
                    "name": "c1",
                    "version": "1.29",
                    "credentials": "aws-prod",
                    "region": "us-west-2",
                    "vpc_id": "vpc-1",
                    "subnet_id": ["subnet-1"],
                    "cluster_role_arn": "arn:aws:iam::123:role/eks",
                    "security_groups": ["sg-1"],
                    "nodepools": [
                        {
                            "name": "workers",
                            "instance_type": "m5.large",
                            "disk_size": 20,
                            "security_groups": ["sg-1"],
                            "iam_role": "arn:aws:iam::123:role/node"
                        }
                    ]
                }
            }
        ]
    }"#;

    struct Workspace {
        _dir: tempfile::TempDir,
        file: PathBuf,
        backend: LocalBackend,
    }

    fn workspace() -> Workspace {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.json");
        std::fs::write(&file, CONFIG).unwrap();
        let backend = LocalBackend::with_path(dir.path().join("nimbus.state.json"));
        Workspace {
            _dir: dir,
            file,
            backend,
        }
    }

    fn connection_to(server: &MockServer) -> Connection {
        Connection {
            url: server.uri(),
            token: "t".to_string(),
            timeout_secs: 30,
        }
    }

    async fn mount_credentials(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/clusters/api/CloudCredentials"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": "cred-1" }])),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn apply_records_created_identifier() {
        let server = MockServer::start().await;
        mount_credentials(&server).await;
        Mock::given(method("POST"))
            .and(path("/clusters/api/txn"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "created": [{ "modelIndex": "ClusterType", "id": "ct-9", "name": "c1" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ws = workspace();
        run_apply(&ws.file, &connection_to(&server), &ws.backend)
            .await
            .unwrap();

        let state = ws.backend.read_state().await.unwrap().unwrap();
        assert_eq!(state.identifier("eks_cluster_type", "main"), Some("ct-9"));
    }

    #[tokio::test]
    async fn failed_create_leaves_no_identifier() {
        let server = MockServer::start().await;
        mount_credentials(&server).await;
        Mock::given(method("POST"))
            .and(path("/clusters/api/txn"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let ws = workspace();
        let err = run_apply(&ws.file, &connection_to(&server), &ws.backend)
            .await
            .unwrap_err();
        assert_eq!(err, "Apply failed. 0 succeeded, 1 failed.");

        let state = ws.backend.read_state().await.unwrap();
        assert!(
            state
                .as_ref()
                .and_then(|s| s.identifier("eks_cluster_type", "main"))
                .is_none()
        );
    }

    #[tokio::test]
    async fn known_resource_is_not_sent_to_backend() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let ws = workspace();
        let mut state = StateFile::new();
        state.upsert_resource(ResourceState::new("eks_cluster_type", "main", "nirmata", "ct-1"));
        save_state(&ws.backend, &mut state).await.unwrap();

        run_apply(&ws.file, &connection_to(&server), &ws.backend)
            .await
            .unwrap();

        let state = ws.backend.read_state().await.unwrap().unwrap();
        assert_eq!(state.identifier("eks_cluster_type", "main"), Some("ct-1"));
        assert_eq!(state.serial, 1);
    }

    #[tokio::test]
    async fn create_is_abandoned_after_timeout() {
        let server = MockServer::start().await;
        mount_credentials(&server).await;
        Mock::given(method("POST"))
            .and(path("/clusters/api/txn"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "created": [] }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let ws = workspace();
        let resources = load_resources(&ws.file).unwrap();
        let provider = get_provider(&connection_to(&server)).unwrap();

        let err = create_with_timeout(&provider, &resources[0], Some(Duration::from_millis(200)))
            .await
            .unwrap_err();
        assert_eq!(err, "timed out after 200ms");
    }

    #[test]
    fn create_timeout_comes_from_resource_type() {
        assert_eq!(
            create_timeout(&ResourceId::new("eks_cluster_type", "main")),
            Some(Duration::from_secs(3600))
        );
        assert_eq!(create_timeout(&ResourceId::new("gke_cluster_type", "main")), None);
    }

    fn cluster(name: &str) -> Resource {
        let s = |v: &str| Value::String(v.to_string());
        Resource::new("eks_cluster_type", "main")
            .with_attribute("name", s(name))
            .with_attribute("version", s("1.29"))
            .with_attribute("credentials", s("aws-prod"))
            .with_attribute("region", s("us-west-2"))
            .with_attribute("vpc_id", s("vpc-1"))
            .with_attribute("subnet_id", Value::List(vec![s("subnet-1")]))
            .with_attribute("cluster_role_arn", s("arn:aws:iam::123:role/eks"))
            .with_attribute("security_groups", Value::List(vec![s("sg-1")]))
            .with_attribute("nodepools", Value::List(vec![]))
    }

    #[test]
    fn valid_resources_pass() {
        assert!(validate_resources(&[cluster("c1")]).is_ok());
    }

    #[test]
    fn errors_are_prefixed_with_resource() {
        let err = validate_resources(&[cluster("C1")]).unwrap_err();
        assert!(err.starts_with("eks_cluster_type.main:"));
    }

    #[test]
    fn unknown_type_is_reported() {
        let err = validate_resources(&[Resource::new("gke_cluster_type", "x")]).unwrap_err();
        assert_eq!(err, "gke_cluster_type.x: unknown resource type");
    }

    #[tokio::test]
    async fn import_records_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.json");
        std::fs::write(
            &file,
            r#"{ "resources": [ { "type": "eks_cluster_type", "name": "main" } ] }"#,
        )
        .unwrap();
        let backend = LocalBackend::with_path(dir.path().join("nimbus.state.json"));
        let connection = Connection {
            url: "http://127.0.0.1:9".to_string(),
            token: "t".to_string(),
            timeout_secs: 1,
        };

        run_import(&file, "main", "ct-42", &connection, &backend)
            .await
            .unwrap();

        let state = backend.read_state().await.unwrap().unwrap();
        assert_eq!(state.identifier("eks_cluster_type", "main"), Some("ct-42"));
        assert_eq!(state.serial, 1);

        let err = run_import(&file, "other", "ct-1", &connection, &backend)
            .await
            .unwrap_err();
        assert!(err.contains("No resource named 'other'"));
    }
}
