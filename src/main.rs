// ==========================================
// 仓储履约装箱系统 - 命令行入口
// ==========================================
// 用法:
//   fulfillment-pack run [shipment_id...]
//   fulfillment-pack resume <shipment_id>
//   fulfillment-pack pack <shipment_id>
//   fulfillment-pack route <shipment_id>
//   fulfillment-pack issues <shipment_id>
//   fulfillment-pack import-rules <csv_path>
//   fulfillment-pack set-config <key> <value>
//   fulfillment-pack init-db
// 数据库: FULFILLMENT_PACK_DB_PATH 或用户数据目录
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use fulfillment_pack::app::{get_default_db_path, AppState};
use fulfillment_pack::logging;
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn required_arg(args: &mut impl Iterator<Item = String>, name: &str) -> Result<String> {
    args.next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("缺少参数 <{}>", name))
}

fn print_usage() {
    println!("{} {}", fulfillment_pack::APP_NAME, fulfillment_pack::VERSION);
    println!();
    println!("用法:");
    println!("  fulfillment-pack run [shipment_id...]      批量装箱 + 路由（不传则处理全部）");
    println!("  fulfillment-pack resume <shipment_id>      续跑挂起的发运单");
    println!("  fulfillment-pack pack <shipment_id>        仅装箱");
    println!("  fulfillment-pack route <shipment_id>       仅路由");
    println!("  fulfillment-pack issues <shipment_id>      查看上报的问题");
    println!("  fulfillment-pack import-rules <csv_path>   导入装箱规则");
    println!("  fulfillment-pack set-config <key> <value>  写入全局配置");
    println!("  fulfillment-pack init-db                   初始化数据库");
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path).map_err(|e| anyhow!(e)).context("初始化应用状态失败")?;
    let api = state.fulfillment_api.clone();

    match command.as_str() {
        "run" => {
            let shipment_ids: Vec<String> = args.collect();
            let summary = api.run_batch(shipment_ids).await?;
            print_json(&summary)?;
        }
        "resume" => {
            let shipment_id = required_arg(&mut args, "shipment_id")?;
            print_json(&api.resume_shipment(&shipment_id).await?)?;
        }
        "pack" => {
            let shipment_id = required_arg(&mut args, "shipment_id")?;
            print_json(&api.pack_shipment(&shipment_id).await?)?;
        }
        "route" => {
            let shipment_id = required_arg(&mut args, "shipment_id")?;
            print_json(&api.route_shipment(&shipment_id).await?)?;
        }
        "issues" => {
            let shipment_id = required_arg(&mut args, "shipment_id")?;
            print_json(&api.list_issues(&shipment_id)?)?;
        }
        "import-rules" => {
            let csv_path = required_arg(&mut args, "csv_path")?;
            print_json(&api.import_pack_rules(&csv_path)?)?;
        }
        "set-config" => {
            let key = required_arg(&mut args, "key")?;
            let value = required_arg(&mut args, "value")?;
            api.set_config(&key, &value)?;
            println!("{}={}", key, value);
        }
        "init-db" => {
            println!("数据库已就绪: {}", state.db_path);
        }
        "help" | "-h" | "--help" => print_usage(),
        other => {
            print_usage();
            bail!("未知命令: {}", other);
        }
    }

    Ok(())
}
