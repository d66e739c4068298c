use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::audit;
use crate::client::{FedoraClient, RepositoryClient};
use crate::config::Settings;
use crate::confirm::StdinConfirmation;
use crate::cursor::{self, ResultSet};
use crate::delete;
use crate::harvest;
use crate::labels;
use crate::load_config::load_config;
use crate::query::SearchQuery;
use crate::reindex;
use crate::relationships;
use crate::versions;

/// CLI for fedora-harvest: audit, harvest and maintain collections in a
/// Fedora repository over its REST API.
#[derive(Parser)]
#[clap(
    name = "fedora-harvest",
    version,
    about = "Audit, harvest and maintain compound-object collections in a Fedora repository"
)]
pub struct Cli {
    /// Path to the YAML config file
    #[clap(long, default_value = "config.yml")]
    pub config: PathBuf,
    #[clap(subcommand)]
    pub command: Commands,
}

/// Search filters shared by every collection-scoped operation.
#[derive(Args)]
pub struct QueryArgs {
    /// Parent namespace of the collection (prefix match on the pid)
    #[clap(short = 'p', long)]
    pub namespace: Option<String>,
    /// Descriptive metadata field to filter on (requires --dc-value)
    #[clap(long)]
    pub dc_field: Option<String>,
    /// Value for the descriptive metadata filter (requires --dc-field)
    #[clap(long)]
    pub dc_value: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a datastream for every matched object
    Harvest {
        #[clap(flatten)]
        query: QueryArgs,
        /// Datastream id to harvest (defaults to the configured dsid)
        #[clap(long)]
        dsid: Option<String>,
        /// Resolve memberships first and skip page objects
        #[clap(long)]
        skip_pages: bool,
    },
    /// Flag compound objects whose parts are missing a datastream
    Audit {
        #[clap(flatten)]
        query: QueryArgs,
        /// Datastream id to probe (defaults to the configured dsid)
        #[clap(long)]
        dsid: Option<String>,
        /// Membership relationship to resolve
        #[clap(long, default_value = "isMemberOf")]
        relationship: String,
        /// Where to write the flagged pid list
        #[clap(long, default_value = "pids_to_delete.txt")]
        output: PathBuf,
    },
    /// Delete all but the newest version of a datastream for every matched object
    PurgeVersions {
        #[clap(flatten)]
        query: QueryArgs,
        /// Datastream id to purge
        #[clap(long)]
        dsid: String,
    },
    /// Resolve and print the membership relationship for every matched object
    Relationships {
        #[clap(flatten)]
        query: QueryArgs,
        #[clap(long, default_value = "isMemberOf")]
        relationship: String,
    },
    /// Rewrite object labels from parent metadata plus the page ordinal
    UpdateLabels {
        #[clap(flatten)]
        query: QueryArgs,
        #[clap(long, default_value = "isMemberOf")]
        relationship: String,
        /// Element local name to read the label from in descriptive metadata
        #[clap(long)]
        label_element: String,
    },
    /// Push every matched object back through the gsearch indexer
    Reindex {
        #[clap(flatten)]
        query: QueryArgs,
        /// Resolve memberships first and skip page objects
        #[clap(long)]
        skip_pages: bool,
        /// Where to write per-identifier outcomes
        #[clap(long, default_value = "gsearch_log.txt")]
        log: PathBuf,
    },
    /// Write all matched identifiers to a file, one per line
    WriteResults {
        #[clap(flatten)]
        query: QueryArgs,
        #[clap(long, default_value = "results.txt")]
        output: PathBuf,
    },
    /// Count the matched identifiers
    Count {
        #[clap(flatten)]
        query: QueryArgs,
    },
    /// Purge every object named in a pid-list file
    PurgeObjects {
        /// Pid list produced by the audit
        #[clap(long, default_value = "pids_to_delete.txt")]
        list: PathBuf,
    },
}

async fn populate_from(
    client: &dyn RepositoryClient,
    settings: &Settings,
    query: &QueryArgs,
) -> ResultSet {
    let url = SearchQuery::new()
        .parent_namespace(query.namespace.clone())
        .descriptive_filter(query.dc_field.clone(), query.dc_value.clone())
        .url(settings);
    cursor::populate(client, &url).await
}

/// Removes page objects (anything with a membership parent) from the set.
async fn drop_pages(client: &dyn RepositoryClient, settings: &Settings, set: &mut ResultSet) {
    let memberships = relationships::resolve(client, settings, &set.results, "isMemberOf").await;
    let children: Vec<String> = memberships.into_iter().map(|record| record.child).collect();
    set.remove_all(&children);
}

/// Async CLI entrypoint shared by main() and integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = load_config(&cli.config)?;
    let client = FedoraClient::new(&settings)
        .map_err(|e| anyhow::anyhow!("building repository client: {e}"))?;

    match cli.command {
        Commands::Harvest {
            query,
            dsid,
            skip_pages,
        } => {
            let mut set = populate_from(&client, &settings, &query).await;
            if skip_pages {
                drop_pages(&client, &settings, &mut set).await;
            }
            let report =
                harvest::harvest_metadata(&client, &settings, &set.results, dsid.as_deref())
                    .await?;
            println!("\nDownloaded {} of {} records.", report.downloaded, set.count());
            for (pid, status) in &report.failures {
                println!("Could not harvest {pid}: {status}.");
            }
        }
        Commands::Audit {
            query,
            dsid,
            relationship,
            output,
        } => {
            let set = populate_from(&client, &settings, &query).await;
            let dsid = dsid.unwrap_or_else(|| settings.default_dsid.clone());
            let result =
                audit::audit_missing(&client, &settings, &set, &dsid, &relationship, &output)
                    .await?;
            println!("Here is a list of objects that have parts missing a {dsid}:");
            for (total, pid) in result.items_to_remove.iter().enumerate() {
                println!("{}. {pid}", total + 1);
            }
            println!("\nThese are the book objects that have some bad pages:");
            for (total, pid) in result.book_objects_to_remove.iter().enumerate() {
                println!("{}. {pid}", total + 1);
            }
        }
        Commands::PurgeVersions { query, dsid } => {
            let set = populate_from(&client, &settings, &query).await;
            versions::purge_all_but_newest(
                &client,
                &settings,
                &StdinConfirmation,
                &set.results,
                &dsid,
            )
            .await?;
        }
        Commands::Relationships {
            query,
            relationship,
        } => {
            let set = populate_from(&client, &settings, &query).await;
            let memberships =
                relationships::resolve(&client, &settings, &set.results, &relationship).await;
            for record in &memberships {
                match &record.ordinal {
                    Some(ordinal) => println!(
                        "{} {relationship} {} (page {ordinal})",
                        record.child, record.parent
                    ),
                    None => println!("{} {relationship} {}", record.child, record.parent),
                }
            }
            println!(
                "\nResolved {} of {} memberships.",
                memberships.len(),
                set.count()
            );
        }
        Commands::UpdateLabels {
            query,
            relationship,
            label_element,
        } => {
            let set = populate_from(&client, &settings, &query).await;
            let updated = labels::update_labels(
                &client,
                &settings,
                &set.results,
                &relationship,
                &label_element,
            )
            .await?;
            println!("\nUpdated {updated} of {} labels.", set.count());
        }
        Commands::Reindex {
            query,
            skip_pages,
            log,
        } => {
            let mut set = populate_from(&client, &settings, &query).await;
            if skip_pages {
                drop_pages(&client, &settings, &mut set).await;
            }
            let report = reindex::update_gsearch(&client, &settings, &set.results, &log).await?;
            for (pid, status) in &report.failures {
                println!("Failed to reindex {pid} ({status}).");
            }
        }
        Commands::WriteResults { query, output } => {
            let set = populate_from(&client, &settings, &query).await;
            println!("\nWriting results to {}.", output.display());
            harvest::write_results(&output, &set.results)?;
            println!("Done");
        }
        Commands::Count { query } => {
            let set = populate_from(&client, &settings, &query).await;
            println!("\nTotal matching documents: {}", set.count());
        }
        Commands::PurgeObjects { list } => {
            delete::purge_listed_objects(&client, &settings, &StdinConfirmation, &list).await?;
        }
    }
    Ok(())
}
