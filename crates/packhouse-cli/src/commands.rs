//! Subcommand handlers.
//!
//! Each handler performs one storage operation and prints the result, either
//! as a short pt-BR line for the operator or as JSON with `--json`.

use crate::cli::{
    BackupCommands, BrandCommands, Commands, MaterialCommands, MovementCommands,
    ProductionCommands, SettingCommands,
};
use anyhow::{Context, Result, bail};
use packhouse_storage::models::{
    MaterialUpdate, MovementFilter, NewMaterial, NewMovement, NewProduction, ProductionFilter,
    ProductionUpdate,
};
use packhouse_storage::{
    BackupManager, BrandRepository, Database, DisplayMessages, IntegrityChecker, InventoryStats,
    InventoryStore, Material, Movement, ProductionRepository, Seeder, SqliteBrandRepository,
    SqliteProductionRepository,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Everything a handler needs, built once per invocation.
pub struct App {
    pub store: InventoryStore,
    pub backups: BackupManager,
    pub brands: SqliteBrandRepository,
    pub production: SqliteProductionRepository,
    pub json: bool,
}

impl App {
    pub fn new(db: &Database, backups: BackupManager, json: bool) -> Self {
        Self {
            store: InventoryStore::new(db),
            backups,
            brands: SqliteBrandRepository::new(db.pool().clone()),
            production: SqliteProductionRepository::new(db.pool().clone()),
            json,
        }
    }

    /// Print `value` as JSON, or run `human` to print it for the operator.
    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(value).context("Failed to serialize output")?
            );
        } else {
            human(value);
        }
        Ok(())
    }

    pub async fn execute(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Seed { force } => self.seed(force).await,
            Commands::Info => self.info().await,
            Commands::Stats => self.stats().await,
            Commands::Check { tolerance } => self.check(tolerance).await,
            Commands::Material(cmd) => self.material(cmd).await,
            Commands::Movement(cmd) => self.movement(cmd).await,
            Commands::Setting(cmd) => self.setting(cmd).await,
            Commands::Backup(cmd) => self.backup(cmd).await,
            Commands::Brand(cmd) => self.brand(cmd).await,
            Commands::Production(cmd) => self.production(cmd).await,
            Commands::Run => self.run().await,
        }
    }

    async fn seed(&self, force: bool) -> Result<()> {
        let seeder = Seeder::new(self.store.clone());
        let report = if force {
            seeder.force_reseed().await.context("Failed to reseed")?
        } else {
            seeder.seed().await.context("Failed to seed")?
        };

        self.emit(&report, |r| {
            if r.is_empty() {
                println!("{}", DisplayMessages::ALREADY_SEEDED);
            } else {
                println!("{}", DisplayMessages::DATA_SEEDED);
                println!(
                    "  {} materiais, {} movimentações, {} configurações",
                    r.materials, r.movements, r.settings
                );
            }
        })
    }

    async fn info(&self) -> Result<()> {
        let info = Seeder::new(self.store.clone())
            .database_info()
            .await
            .context("Failed to read database info")?;

        self.emit(&info, |i| {
            println!("Dados migrados:   {}", if i.is_seeded { "sim" } else { "não" });
            println!("Materiais:        {}", i.materials_count);
            println!("Movimentações:    {}", i.movements_count);
            if let Some(date) = &i.last_migration {
                println!("Última migração:  {}", display_value(date));
            }
        })
    }

    async fn stats(&self) -> Result<()> {
        let stats = InventoryStats::collect(&self.store)
            .await
            .context("Failed to compute stats")?;

        self.emit(&stats, |s| {
            println!("Materiais:            {}", s.total_materials);
            println!("Quantidade total:     {}", s.total_quantity);
            println!("Estoque baixo:        {}", s.low_stock_count);
            println!("Movimentações hoje:   {}", s.today_movements);
        })
    }

    async fn check(&self, tolerance: Option<i64>) -> Result<()> {
        let checker = tolerance.map_or_else(IntegrityChecker::new, IntegrityChecker::with_tolerance);
        let report = checker
            .check(&self.store)
            .await
            .context("Failed to check integrity")?;

        self.emit(&report, |r| {
            if r.is_valid {
                println!("{}", DisplayMessages::INTEGRITY_OK);
                return;
            }
            println!("{} ({})", DisplayMessages::INTEGRITY_ISSUES, r.issues.len());
            for issue in &r.issues {
                println!("  - {issue}");
            }
        })
    }

    async fn material(&self, cmd: MaterialCommands) -> Result<()> {
        match cmd {
            MaterialCommands::List => {
                let materials = self
                    .store
                    .get_all_materials()
                    .await
                    .context("Failed to list materials")?;
                self.emit(&materials, |list| list.iter().for_each(print_material))
            }
            MaterialCommands::Show { name } => {
                let material = self
                    .store
                    .get_material_by_name(&name)
                    .await
                    .context("Failed to look up material")?;
                match material {
                    Some(material) => self.emit(&material, print_material),
                    None => bail!("{}: {name}", DisplayMessages::MATERIAL_NOT_FOUND),
                }
            }
            MaterialCommands::Add {
                name,
                quantity,
                unit,
                min_stock,
            } => {
                let mut new = NewMaterial::new(name, quantity);
                if let Some(unit) = unit {
                    new = new.unit(unit);
                }
                if let Some(min_stock) = min_stock {
                    new = new.min_stock(min_stock);
                }

                let material = self
                    .store
                    .add_material(&new)
                    .await
                    .context("Failed to add material")?;
                self.emit(&material, |m| {
                    println!("{}", DisplayMessages::MATERIAL_ADDED);
                    print_material(m);
                })
            }
            MaterialCommands::Update {
                id,
                name,
                quantity,
                unit,
                min_stock,
            } => {
                let update = MaterialUpdate {
                    name,
                    quantity,
                    unit,
                    min_stock,
                };
                if update.is_empty() {
                    bail!("Nothing to update: pass --name, --quantity, --unit or --min-stock");
                }

                let material = self
                    .store
                    .update_material(id, &update)
                    .await
                    .context("Failed to update material")?;
                self.emit(&material, |m| {
                    println!("{}", DisplayMessages::MATERIAL_UPDATED);
                    print_material(m);
                })
            }
            MaterialCommands::Delete { id } => {
                self.store
                    .delete_material(id)
                    .await
                    .context("Failed to delete material")?;
                self.emit(&id, |_| println!("{}", DisplayMessages::MATERIAL_DELETED))
            }
        }
    }

    async fn movement(&self, cmd: MovementCommands) -> Result<()> {
        match cmd {
            MovementCommands::List {
                material,
                kind,
                date,
            } => {
                let filter = MovementFilter {
                    material_name: material,
                    kind,
                    date,
                };
                let movements = self
                    .store
                    .filter_movements(&filter)
                    .await
                    .context("Failed to list movements")?;
                self.emit(&movements, |list| list.iter().for_each(print_movement))
            }
            MovementCommands::Add {
                material,
                kind,
                quantity,
                unit,
                date,
                description,
            } => {
                let mut new = NewMovement::new(material, kind, quantity);
                if let Some(unit) = unit {
                    new = new.unit(unit);
                }
                if let Some(date) = date {
                    new = new.date(date);
                }
                if let Some(description) = description {
                    new = new.description(description);
                }

                let movement = self
                    .store
                    .add_movement(&new)
                    .await
                    .context("Failed to register movement")?;
                self.emit(&movement, |m| {
                    println!("{}", DisplayMessages::MOVEMENT_REGISTERED);
                    print_movement(m);
                })
            }
            MovementCommands::Clear => {
                let removed = self
                    .store
                    .clear_movements_history()
                    .await
                    .context("Failed to clear movement history")?;
                self.emit(&removed, |n| {
                    println!("{} ({n})", DisplayMessages::HISTORY_CLEARED)
                })
            }
        }
    }

    async fn setting(&self, cmd: SettingCommands) -> Result<()> {
        match cmd {
            SettingCommands::List => {
                let settings = self
                    .store
                    .all_settings()
                    .await
                    .context("Failed to list settings")?;
                self.emit(&settings, |list| {
                    for s in list {
                        println!("{:<20} {}", s.key, display_value(&s.value));
                    }
                })
            }
            SettingCommands::Get { key } => {
                let value = self
                    .store
                    .get_setting(&key)
                    .await
                    .context("Failed to read setting")?;
                match value {
                    Some(value) => self.emit(&value, |v| println!("{}", display_value(v))),
                    None => bail!("{}: {key}", DisplayMessages::NOT_FOUND),
                }
            }
            SettingCommands::Set { key, value } => {
                let value = parse_setting_value(&value);
                self.store
                    .save_setting(&key, &value)
                    .await
                    .context("Failed to save setting")?;
                self.emit(&value, |v| println!("{key} = {}", display_value(v)))
            }
        }
    }

    async fn backup(&self, cmd: BackupCommands) -> Result<()> {
        match cmd {
            BackupCommands::Create => {
                let snapshot = self
                    .backups
                    .create_snapshot()
                    .await
                    .context("Failed to create snapshot")?;
                let summary = snapshot.summary();
                self.emit(&summary, |s| {
                    println!("{}: {}", DisplayMessages::BACKUP_CREATED, s.human_date);
                })
            }
            BackupCommands::List => {
                let snapshots = self
                    .backups
                    .list_snapshots()
                    .await
                    .context("Failed to list snapshots")?;
                self.emit(&snapshots, |list| {
                    if list.is_empty() {
                        println!("{}", DisplayMessages::NO_BACKUPS);
                    }
                    for s in list {
                        println!(
                            "{}  {}  {} materiais, {} movimentações  v{}",
                            s.timestamp,
                            s.human_date,
                            s.materials_count,
                            s.movements_count,
                            s.version
                        );
                    }
                })
            }
            BackupCommands::Restore { timestamp } => {
                let report = self
                    .backups
                    .restore_snapshot(&timestamp)
                    .await
                    .context("Failed to restore snapshot")?;
                self.emit(&report, |r| {
                    println!("{}", DisplayMessages::BACKUP_RESTORED);
                    print_import(r);
                })
            }
            BackupCommands::RestoreLatest => {
                let report = self
                    .backups
                    .restore_latest()
                    .await
                    .context("Failed to restore latest snapshot")?;
                self.emit(&report, |r| {
                    println!("{}", DisplayMessages::BACKUP_RESTORED);
                    print_import(r);
                })
            }
            BackupCommands::Delete { timestamp } => {
                let removed = self
                    .backups
                    .delete_snapshot(&timestamp)
                    .await
                    .context("Failed to delete snapshot")?;
                self.emit(&removed, |removed| {
                    if *removed {
                        println!("{}", DisplayMessages::BACKUP_DELETED);
                    } else {
                        println!("{}", DisplayMessages::BACKUP_NOT_FOUND);
                    }
                })
            }
            BackupCommands::Clear => {
                let removed = self
                    .backups
                    .clear_all()
                    .await
                    .context("Failed to clear snapshots")?;
                self.emit(&removed, |n| {
                    println!("{} ({n})", DisplayMessages::BACKUPS_CLEARED)
                })
            }
            BackupCommands::Export { timestamp, dir } => {
                let path = self
                    .backups
                    .export_to_file(timestamp.as_deref(), &dir)
                    .await
                    .context("Failed to export backup")?;
                self.emit(&path, |p| {
                    println!("{}: {}", DisplayMessages::BACKUP_EXPORTED, p.display())
                })
            }
            BackupCommands::Import { file } => {
                let report = self
                    .backups
                    .import_from_file(&file)
                    .await
                    .with_context(|| format!("Failed to import {}", file.display()))?;
                self.emit(&report, |r| {
                    println!("{}", DisplayMessages::BACKUP_IMPORTED);
                    print_import(r);
                })
            }
            BackupCommands::Stats => {
                let stats = self
                    .backups
                    .get_stats()
                    .await
                    .context("Failed to read backup stats")?;
                self.emit(&stats, |s| {
                    println!("Backups:          {}", s.backups_count);
                    println!(
                        "Mais antigo:      {}",
                        s.oldest_timestamp.as_deref().unwrap_or("-")
                    );
                    println!(
                        "Mais recente:     {}",
                        s.newest_timestamp.as_deref().unwrap_or("-")
                    );
                    println!(
                        "Backup automático: {}",
                        if s.auto_backup_enabled { "ativo" } else { "inativo" }
                    );
                })
            }
        }
    }

    async fn brand(&self, cmd: BrandCommands) -> Result<()> {
        match cmd {
            BrandCommands::List => {
                let brands = self.brands.find_all().await.context("Failed to list brands")?;
                self.emit(&brands, |list| {
                    for b in list {
                        println!("{:>4}  {:<20} {:>8.2} kg/caixa", b.id, b.name, b.box_weight);
                    }
                })
            }
            BrandCommands::Add { name, box_weight } => {
                let brand = self
                    .brands
                    .create(&name, box_weight)
                    .await
                    .context("Failed to add brand")?;
                self.emit(&brand, |b| println!("Marca {} cadastrada (#{})", b.name, b.id))
            }
            BrandCommands::Update {
                id,
                name,
                box_weight,
            } => {
                let brand = self
                    .brands
                    .update(id, name.as_deref(), box_weight)
                    .await
                    .context("Failed to update brand")?;
                self.emit(&brand, |b| {
                    println!("Marca {} atualizada: {:.2} kg/caixa", b.name, b.box_weight)
                })
            }
            BrandCommands::Delete { id } => {
                self.brands.delete(id).await.context("Failed to delete brand")?;
                self.emit(&id, |id| println!("Marca #{id} excluída"))
            }
        }
    }

    async fn production(&self, cmd: ProductionCommands) -> Result<()> {
        match cmd {
            ProductionCommands::List { date, brand } => {
                let filter = ProductionFilter {
                    date,
                    brand_id: brand,
                };
                let records = self
                    .production
                    .find(&filter)
                    .await
                    .context("Failed to list production")?;
                self.emit(&records, |list| {
                    for r in list {
                        println!(
                            "{:>4}  {}  {:<20} {:>6} caixas  {:>10.2} kg",
                            r.id, r.date, r.brand_name, r.boxes, r.total_weight
                        );
                    }
                })
            }
            ProductionCommands::Add { date, brand, boxes } => {
                let record = self
                    .production
                    .create(&NewProduction::new(date, brand, boxes))
                    .await
                    .context("Failed to register production")?;
                self.emit(&record, |r| {
                    println!(
                        "Produção registrada: {} caixas de {} ({:.2} kg)",
                        r.boxes, r.brand_name, r.total_weight
                    )
                })
            }
            ProductionCommands::Update {
                id,
                date,
                brand,
                boxes,
            } => {
                let update = ProductionUpdate {
                    date,
                    brand_id: brand,
                    boxes,
                };
                let record = self
                    .production
                    .update(id, &update)
                    .await
                    .context("Failed to update production")?;
                self.emit(&record, |r| {
                    println!(
                        "Produção #{} atualizada: {} caixas de {} ({:.2} kg)",
                        r.id, r.boxes, r.brand_name, r.total_weight
                    )
                })
            }
            ProductionCommands::Delete { id } => {
                self.production
                    .delete(id)
                    .await
                    .context("Failed to delete production")?;
                self.emit(&id, |id| println!("Produção #{id} excluída"))
            }
            ProductionCommands::Summary { date, brand } => {
                let filter = ProductionFilter {
                    date,
                    brand_id: brand,
                };
                let summary = self
                    .production
                    .summary(&filter)
                    .await
                    .context("Failed to summarize production")?;
                self.emit(&summary, |s| {
                    println!("Total de caixas: {}", s.total_boxes);
                    println!("Peso total:      {:.2} kg", s.total_weight);
                })
            }
        }
    }

    /// Session mode: scheduled snapshots until Ctrl-C, then a final one.
    async fn run(&self) -> Result<()> {
        self.backups.begin_session().await;
        info!(
            interval_secs = self.backups.config().auto_backup_interval.as_secs(),
            "Session started; press Ctrl-C to stop"
        );

        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;

        let snapshot = self
            .backups
            .shutdown()
            .await
            .context("Failed to take shutdown snapshot")?;
        self.emit(&snapshot.summary(), |s| {
            println!("{}: {}", DisplayMessages::BACKUP_CREATED, s.human_date)
        })
    }
}

fn print_material(m: &Material) {
    let flag = if m.is_low_stock() { "  (estoque baixo)" } else { "" };
    println!(
        "{:>4}  {:<20} {:>8} {:<10} mín. {:>5}{flag}",
        m.id, m.name, m.quantity, m.unit, m.min_stock
    );
}

fn print_movement(m: &Movement) {
    println!(
        "{:>4}  {}  {:<8} {:<20} {:>6} {}{}",
        m.id,
        packhouse_core::human_date(&m.date),
        m.kind.display_name(),
        m.material_name,
        m.quantity,
        m.unit,
        m.description
            .as_deref()
            .map(|d| format!("  {d}"))
            .unwrap_or_default()
    );
}

fn print_import(r: &packhouse_storage::ImportReport) {
    println!(
        "  {} materiais, {} movimentações ({} sem material)",
        r.materials, r.movements, r.orphaned
    );
}

/// Settings are JSON values; bare words are stored as strings.
fn parse_setting_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
