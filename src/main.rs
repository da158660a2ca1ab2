// ==========================================
// 制造运营管理系统 - 命令行入口
// ==========================================
// 用法: mfg-ops <子命令> [参数...]
// 数据库路径: MFG_OPS_DB_PATH 环境变量优先, 否则用户数据目录
// ==========================================

use std::error::Error;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use mfg_ops::api::{AlertApi, InventoryApi, OptimizationApi, ProductionApi};
use mfg_ops::config::ConfigManager;
use mfg_ops::db::{init_schema, open_sqlite_connection};
use mfg_ops::domain::inventory::NewInventoryItem;
use mfg_ops::domain::production::NewProductionRecord;
use mfg_ops::domain::allocation::NewAlert;
use mfg_ops::domain::types::{AlertSeverity, AlertType, MovementType, OptimizationType};
use mfg_ops::engine::optimizer::Optimizer;
use mfg_ops::engine::outcome::OutcomeStatus;
use mfg_ops::engine::requirements::TableBomProvider;
use mfg_ops::report::{
    render_inventory_report, render_optimization_report, render_production_report, ReportService,
};
use mfg_ops::repository::{
    AlertRepository, AllocationRepository, InventoryRepository, ProductionRepository,
};

/// 数据库路径解析
///
/// 优先环境变量 MFG_OPS_DB_PATH, 其次用户数据目录, 最后当前目录
fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("MFG_OPS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./mfg_ops.db");
    if let Some(data_dir) = dirs::data_dir() {
        let app_dir = data_dir.join("mfg-ops");
        if std::fs::create_dir_all(&app_dir).is_ok() {
            path = app_dir.join("mfg_ops.db");
        }
    }
    path.to_string_lossy().to_string()
}

// ==========================================
// AppContext - 组装全部服务
// ==========================================
struct AppContext {
    inventory_api: InventoryApi,
    production_api: ProductionApi,
    optimization_api: OptimizationApi,
    alert_api: AlertApi,
    reports: ReportService,
    report_rx: mpsc::Receiver<mfg_ops::engine::periodic::IterationReport>,
}

impl AppContext {
    fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = Arc::new(Mutex::new(open_sqlite_connection(db_path)?));
        {
            let guard = conn.lock().map_err(|e| format!("数据库锁中毒: {}", e))?;
            init_schema(&guard)?;
        }

        let config = Arc::new(ConfigManager::from_connection(conn.clone())?);
        let inventory_repo = Arc::new(InventoryRepository::from_connection(conn.clone()));
        let production_repo = Arc::new(ProductionRepository::from_connection(conn.clone()));
        let allocation_repo = Arc::new(AllocationRepository::from_connection(conn.clone()));
        let alert_repo = Arc::new(AlertRepository::from_connection(conn));

        let settings = config.optimizer_settings()?;
        let interval = Duration::from_secs(settings.optimization_interval_secs);
        let bom = Box::new(TableBomProvider::new(production_repo.clone()));
        let optimizer = Arc::new(Optimizer::new(
            inventory_repo.clone(),
            production_repo.clone(),
            allocation_repo.clone(),
            alert_repo.clone(),
            bom,
            settings,
        ));
        let (optimization_api, report_rx) = OptimizationApi::new(optimizer, interval);

        Ok(Self {
            inventory_api: InventoryApi::new(inventory_repo.clone(), config),
            production_api: ProductionApi::new(production_repo.clone()),
            optimization_api,
            alert_api: AlertApi::new(alert_repo),
            reports: ReportService::new(inventory_repo, production_repo, allocation_repo),
            report_rx,
        })
    }
}

fn print_usage() {
    println!("{} v{}", mfg_ops::APP_NAME, mfg_ops::VERSION);
    println!();
    println!("用法: mfg-ops <子命令> [参数...]");
    println!();
    println!("  status                                   库存状态摘要");
    println!("  add-item <part_number> <名称> <单价> <初始库存> [订货点] [订货批量] [类别]");
    println!("                                           新增物料");
    println!("  items                                    物料列表（含库存指标）");
    println!("  item <item_id>                           物料详情");
    println!("  low-stock                                低库存物料与补货建议");
    println!("  stock <item_id> <IN|OUT|ADJUSTMENT> <数量> [操作员]");
    println!("                                           库存变更");
    println!("  movements [item_id]                      库存流水历史");
    println!("  add-supplier <名称> [交货周期天数]        新增供应商");
    println!("  suppliers                                供应商列表");
    println!("  add-line <名称> <小时产能> <目标效率0-1> [开机成本]");
    println!("                                           新增产线");
    println!("  lines                                    产线列表");
    println!("  efficiency [天数]                         产线近期效率");
    println!("  set-bom <line_id> <item_id> <单位用量>    维护产线 BOM 行");
    println!("  record <line_id> <product_id> <计划数> <实产数> [不良数] [停机分钟]");
    println!("                                           录入班次生产记录");
    println!("  records <line_id> [天数]                  产线生产记录");
    println!("  enqueue <product_id> <数量> <优先级1|2>   排产任务入队");
    println!("  jobs                                     待排产任务列表");
    println!("  production-report [天数]                  生产绩效摘要");
    println!("  optimize-inventory                       库存分配优化");
    println!("  optimize-schedule                        生产排程优化");
    println!("  analyze-utilization                      资源利用率分析");
    println!("  history [inventory|production|resource] [天数]");
    println!("                                           优化历史");
    println!("  optimization-report [天数]                优化运行摘要");
    println!("  alerts                                   未解决告警");
    println!("  raise-alert <LOW|MEDIUM|HIGH|CRITICAL> <标题> <内容>");
    println!("                                           人工发布系统告警");
    println!("  resolve-alert <alert_id>                 解决告警");
    println!("  run-loop <迭代次数>                       周期优化循环演示");
}

fn print_outcome(outcome: &mfg_ops::engine::outcome::OptimizeOutcome) {
    match outcome.status {
        OutcomeStatus::Success => {
            println!(
                "优化成功: run_id={} 目标值={:.2} 耗时={:.3}s",
                outcome.run_id.as_deref().unwrap_or("-"),
                outcome.objective_value.unwrap_or(0.0),
                outcome.execution_time
            );
            if let Some(payload) = &outcome.payload {
                match serde_json::to_string_pretty(payload) {
                    Ok(json) => println!("{}", json),
                    Err(e) => println!("(结果序列化失败: {})", e),
                }
            }
        }
        OutcomeStatus::Failed => {
            println!(
                "优化失败: 原因={} run_id={}",
                outcome
                    .reason
                    .as_ref()
                    .map(|r| r.as_str())
                    .unwrap_or("unknown"),
                outcome.run_id.as_deref().unwrap_or("-"),
            );
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    mfg_ops::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };

    let db_path = get_default_db_path();
    tracing::info!(db_path = %db_path, "使用数据库");
    let ctx = AppContext::new(&db_path)?;

    match command.as_str() {
        "status" => {
            let report = ctx.reports.inventory_report()?;
            print!("{}", render_inventory_report(&report));
        }

        "low-stock" => {
            let suggestions = ctx.inventory_api.reorder_suggestions()?;
            if suggestions.is_empty() {
                println!("当前没有低库存物料");
            }
            for s in suggestions {
                println!(
                    "{:<14} {:<20} 库存 {:>6} / 订货点 {:>6}  建议补货 {:>6} (预估 {:.2}, 紧急度 {:.0}){}",
                    s.part_number,
                    s.name,
                    s.current_stock,
                    s.reorder_point,
                    s.suggested_quantity,
                    s.estimated_cost,
                    s.urgency_score,
                    if s.critical { "  [紧急]" } else { "" }
                );
            }
        }

        "stock" => {
            let item_id: i64 = args.get(1).ok_or("缺少 item_id")?.parse()?;
            let movement_type = args
                .get(2)
                .and_then(|s| MovementType::parse(s))
                .ok_or("流水类型应为 IN/OUT/ADJUSTMENT")?;
            let quantity: i64 = args.get(3).ok_or("缺少数量")?.parse()?;
            let operator = args.get(4).map(|s| s.as_str());

            let change = ctx.inventory_api.update_stock(
                item_id,
                quantity,
                movement_type,
                None,
                None,
                operator,
            )?;
            println!(
                "库存已更新: item_id={} {} -> {}",
                change.item_id, change.old_stock, change.new_stock
            );
        }

        "add-item" => {
            let item = NewInventoryItem {
                part_number: args.get(1).ok_or("缺少 part_number")?.clone(),
                name: args.get(2).ok_or("缺少名称")?.clone(),
                category: args.get(7).cloned(),
                unit_cost: args.get(3).ok_or("缺少单价")?.parse()?,
                current_stock: args.get(4).ok_or("缺少初始库存")?.parse()?,
                minimum_stock: 0,
                maximum_stock: 1000,
                reorder_point: args.get(5).map(|s| s.parse()).transpose()?.unwrap_or(0),
                reorder_quantity: args.get(6).map(|s| s.parse()).transpose()?.unwrap_or(0),
                supplier_id: None,
                location: None,
            };
            let item_id = ctx.inventory_api.create_item(item)?;
            println!("物料已创建: id={}", item_id);
        }

        "items" => {
            for entry in ctx.inventory_api.list_items()? {
                println!(
                    "#{:<4} {:<14} {:<20} 库存 {:>6}  状态 {:<12} 可供 {:.1} 天",
                    entry.item.id,
                    entry.item.part_number,
                    entry.item.name,
                    entry.item.current_stock,
                    entry.metrics.status.as_str(),
                    entry.metrics.days_of_supply
                );
            }
        }

        "item" => {
            let item_id: i64 = args.get(1).ok_or("缺少 item_id")?.parse()?;
            let item = ctx.inventory_api.get_item(item_id)?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }

        "records" => {
            let line_id: i64 = args.get(1).ok_or("缺少 line_id")?.parse()?;
            let days: i64 = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(7);
            for r in ctx.production_api.records_since(line_id, days)? {
                println!(
                    "{}  {:<12} 计划 {:>6} 实产 {:>6} 不良 {:>4} 效率 {:>5.1}%",
                    r.created_at.to_rfc3339(),
                    r.product_id,
                    r.planned_quantity,
                    r.actual_quantity,
                    r.defective_quantity,
                    r.efficiency * 100.0
                );
            }
        }

        "add-line" => {
            let name = args.get(1).ok_or("缺少产线名称")?;
            let capacity_per_hour: i64 = args.get(2).ok_or("缺少小时产能")?.parse()?;
            let efficiency_target: f64 = args.get(3).ok_or("缺少目标效率")?.parse()?;
            // 缺省与建表默认一致
            let setup_cost: f64 = args.get(4).map(|s| s.parse()).transpose()?.unwrap_or(10.0);
            let line_id =
                ctx.production_api
                    .create_line(name, capacity_per_hour, efficiency_target, setup_cost)?;
            println!("产线已创建: id={}", line_id);
        }

        "lines" => {
            for line in ctx.production_api.list_lines()? {
                println!(
                    "#{:<4} {:<20} 产能 {:>5}/h  目标效率 {:.0}%  开机成本 {:.2}",
                    line.id,
                    line.name,
                    line.capacity_per_hour,
                    line.efficiency_target * 100.0,
                    line.setup_cost
                );
            }
        }

        "set-bom" => {
            let line_id: i64 = args.get(1).ok_or("缺少 line_id")?.parse()?;
            let item_id: i64 = args.get(2).ok_or("缺少 item_id")?.parse()?;
            let qty_per_unit: f64 = args.get(3).ok_or("缺少单位用量")?.parse()?;
            ctx.production_api.set_bom_row(line_id, item_id, qty_per_unit)?;
            println!("BOM 行已更新: line_id={} item_id={}", line_id, item_id);
        }

        "jobs" => {
            let jobs = ctx.production_api.pending_jobs()?;
            if jobs.is_empty() {
                println!("当前没有待排产任务");
            }
            for job in jobs {
                println!(
                    "#{:<4} {:<12} 数量 {:>6}  优先级 {}  {}",
                    job.id,
                    job.product_id,
                    job.quantity,
                    job.priority,
                    job.due_date
                        .map(|d| d.to_rfc3339())
                        .unwrap_or_else(|| "无交期".to_string())
                );
            }
        }

        "movements" => {
            let item_id = args.get(1).map(|s| s.parse()).transpose()?;
            for m in ctx.inventory_api.movement_history(item_id, None)? {
                println!(
                    "{}  item={:<4} {:<10} {:>7}  {}",
                    m.created_at.to_rfc3339(),
                    m.inventory_item_id,
                    m.movement_type.as_str(),
                    m.quantity,
                    m.operator.as_deref().unwrap_or("-")
                );
            }
        }

        "efficiency" => {
            let days = args.get(1).map(|s| s.parse()).transpose()?;
            for line in ctx.production_api.line_efficiencies(days)? {
                println!(
                    "#{:<4} {:<20} 实际 {:>6.1}% / 目标 {:>6.1}%",
                    line.line_id, line.line_name, line.current_efficiency, line.target_efficiency
                );
            }
        }

        "add-supplier" => {
            let name = args.get(1).ok_or("缺少供应商名称")?;
            let lead_time_days: i64 = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(7);
            let supplier_id = ctx.inventory_api.create_supplier(name, lead_time_days)?;
            println!("供应商已创建: id={}", supplier_id);
        }

        "suppliers" => {
            let suppliers = ctx.inventory_api.list_suppliers()?;
            if suppliers.is_empty() {
                println!("尚未录入供应商");
            }
            for s in suppliers {
                println!("#{:<4} {:<30} 交货周期 {} 天", s.id, s.name, s.lead_time_days);
            }
        }

        "record" => {
            let record = NewProductionRecord {
                production_line_id: args.get(1).ok_or("缺少 line_id")?.parse()?,
                product_id: args.get(2).ok_or("缺少 product_id")?.clone(),
                shift_id: None,
                planned_quantity: args.get(3).ok_or("缺少计划数")?.parse()?,
                actual_quantity: args.get(4).ok_or("缺少实产数")?.parse()?,
                defective_quantity: args.get(5).map(|s| s.parse()).transpose()?.unwrap_or(0),
                downtime_minutes: args.get(6).map(|s| s.parse()).transpose()?.unwrap_or(0),
                quality_score: 100.0,
            };
            let record_id = ctx.production_api.record_production(record)?;
            println!("生产记录已录入: id={}", record_id);
        }

        "enqueue" => {
            let product_id = args.get(1).ok_or("缺少 product_id")?;
            let quantity: i64 = args.get(2).ok_or("缺少数量")?.parse()?;
            let priority: i64 = args.get(3).ok_or("缺少优先级")?.parse()?;
            let job_id = ctx
                .production_api
                .enqueue_job(product_id, quantity, priority, None)?;
            println!("排产任务已入队: id={}", job_id);
        }

        "production-report" => {
            let days = args.get(1).map(|s| s.parse()).transpose()?;
            let report = ctx.reports.production_report(days)?;
            print!("{}", render_production_report(&report));
        }

        "optimize-inventory" => {
            let outcome = ctx.optimization_api.optimize_inventory()?;
            print_outcome(&outcome);
        }

        "optimize-schedule" => {
            let outcome = ctx.optimization_api.optimize_schedule()?;
            print_outcome(&outcome);
        }

        "analyze-utilization" => {
            let outcome = ctx.optimization_api.analyze_utilization()?;
            print_outcome(&outcome);
        }

        "history" => {
            let optimization_type = match args.get(1).map(|s| s.as_str()) {
                Some("inventory") => Some(OptimizationType::Inventory),
                Some("production") => Some(OptimizationType::Production),
                Some("resource") => Some(OptimizationType::Resource),
                Some(other) if other.parse::<i64>().is_err() => {
                    return Err(format!("未知的优化类别: {}", other).into());
                }
                _ => None,
            };
            // 第一个参数也允许直接给天数
            let days = args
                .iter()
                .skip(1)
                .find_map(|s| s.parse::<i64>().ok());

            let entries = ctx.optimization_api.history(optimization_type, days)?;
            if entries.is_empty() {
                println!("回溯期内没有优化运行记录");
            }
            for entry in entries {
                println!(
                    "{}  {:<10} {:<9} 目标值 {:>10.2}  {:.3}s  {}",
                    entry.created_at.to_rfc3339(),
                    entry.optimization_type.as_str(),
                    entry.status.as_str(),
                    entry.objective_value,
                    entry.execution_time_seconds,
                    entry.results_summary
                );
            }
        }

        "optimization-report" => {
            let days = args.get(1).map(|s| s.parse()).transpose()?;
            let report = ctx.reports.optimization_report(days)?;
            print!("{}", render_optimization_report(&report));
        }

        "alerts" => {
            let alerts = ctx.alert_api.open_alerts()?;
            if alerts.is_empty() {
                println!("当前没有未解决告警");
            }
            for alert in alerts {
                println!(
                    "[{}] #{} {} - {} ({})",
                    alert.severity,
                    alert.id,
                    alert.title,
                    alert.message,
                    alert.created_at.to_rfc3339()
                );
            }
        }

        "raise-alert" => {
            let severity = args
                .get(1)
                .and_then(|s| AlertSeverity::parse(s))
                .ok_or("级别应为 LOW/MEDIUM/HIGH/CRITICAL")?;
            let title = args.get(2).ok_or("缺少标题")?.clone();
            let message = args.get(3).ok_or("缺少内容")?.clone();

            let created = ctx.alert_api.raise(NewAlert {
                alert_type: AlertType::System,
                severity,
                title,
                message,
                source_id: None,
                source_type: Some("SYSTEM".to_string()),
            })?;
            if created {
                println!("告警已发布");
            } else {
                println!("同源告警已存在, 未重复发布");
            }
        }

        "resolve-alert" => {
            let alert_id: i64 = args.get(1).ok_or("缺少 alert_id")?.parse()?;
            ctx.alert_api.resolve(alert_id)?;
            println!("告警已解决: id={}", alert_id);
        }

        "run-loop" => {
            let iterations: u64 = args.get(1).ok_or("缺少迭代次数")?.parse()?;
            if iterations == 0 {
                return Err("迭代次数必须为正".into());
            }

            ctx.optimization_api.start_periodic();
            let mut seen = 0u64;
            while seen < iterations {
                match ctx.report_rx.recv_timeout(Duration::from_secs(600)) {
                    Ok(report) => {
                        seen += 1;
                        println!(
                            "迭代 #{}: 库存分配 {:?}, 排程 {:?}",
                            report.sequence, report.inventory, report.schedule
                        );
                    }
                    Err(_) => break,
                }
            }
            if !ctx.optimization_api.stop_periodic() {
                tracing::error!("周期优化未能在限时内停止");
            }
        }

        _ => {
            print_usage();
            return Err(format!("未知子命令: {}", command).into());
        }
    }

    Ok(())
}
