//! # 示例应用程序
//!
//! 演示如何使用 Lorn DI 容器注册和解析一个小型对象图

use anyhow::Context;
use clap::Parser;
use di_abstractions::{Binding, ContainerConfig, Scope};
use di_impl::{Container, ContainerBuilder};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn DI 示例应用")]
struct Args {
    /// 容器配置文件路径
    #[arg(short, long, default_value = "config/di.toml")]
    config: String,

    /// 日志级别（设置 RUST_LOG 时以其为准）
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 解析请求处理器的次数
    #[arg(long, default_value_t = 3)]
    requests: u32,
}

/// 广告服务配置
#[derive(Debug)]
struct AdServerSettings {
    endpoint: String,
    floor_price: u32,
}

/// 出站 HTTP 客户端
#[derive(Debug)]
struct HttpClient {
    base_url: String,
    connection_id: u64,
}

/// 每个请求一个的处理器
#[derive(Debug)]
struct RequestHandler {
    request_id: u64,
    client: Arc<HttpClient>,
    floor_price: u32,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("启动 Lorn DI 示例应用");

    let config = load_config(&args.config)?;
    let container = build_container(config);

    demonstrate_resolution(&container, args.requests)?;
    demonstrate_swap(&container)?;
    demonstrate_missing_binding(&container);

    let stats = container.stats();
    info!(
        "容器统计: {} 个绑定, {} 个已解析单例, {} 次解析, 命中率 {:.1}%",
        stats.bound,
        stats.resolved_singletons,
        stats.resolutions,
        stats.hit_rate() * 100.0
    );
    Ok(())
}

/// 加载容器配置，文件不存在时使用默认配置
fn load_config(path: &str) -> anyhow::Result<ContainerConfig> {
    if !Path::new(path).exists() {
        info!("配置文件不存在，使用默认配置: {}", path);
        return Ok(ContainerConfig::default());
    }
    let config = ContainerConfig::from_file(path).with_context(|| format!("无法加载配置 {path}"))?;
    info!("重新绑定策略: {:?}", config.rebind_policy);
    Ok(config)
}

/// 构建容器
fn build_container(config: ContainerConfig) -> Container {
    let connections = Arc::new(AtomicU64::new(0));
    let requests = Arc::new(AtomicU64::new(0));

    ContainerBuilder::new()
        .with_config(config)
        .factory(Binding::<RequestHandler>::of(), move |c| {
            Ok(RequestHandler {
                request_id: requests.fetch_add(1, Ordering::Relaxed) + 1,
                client: c.get(&Binding::<HttpClient>::of())?,
                floor_price: c.get(&Binding::<AdServerSettings>::of())?.floor_price,
            })
        })
        .singleton(Binding::<HttpClient>::of(), move |c| {
            let settings = c.get(&Binding::<AdServerSettings>::of())?;
            Ok(HttpClient {
                base_url: settings.endpoint.clone(),
                connection_id: connections.fetch_add(1, Ordering::Relaxed) + 1,
            })
        })
        .bind_once(
            Binding::<AdServerSettings>::of(),
            |_| {
                Ok(AdServerSettings {
                    endpoint: "https://ads.example/bid".to_string(),
                    floor_price: 15,
                })
            },
            Scope::Singleton,
        )
        .build()
}

/// 演示作用域语义
fn demonstrate_resolution(container: &Container, requests: u32) -> anyhow::Result<()> {
    info!("演示组件解析");

    for _ in 0..requests {
        let handler = container.get(&Binding::<RequestHandler>::of())?;
        info!(
            "请求 {} -> {} (连接 {}, 底价 {})",
            handler.request_id, handler.client.base_url, handler.client.connection_id, handler.floor_price
        );
    }

    for binding in container.bindings() {
        info!("绑定 {} [{}] 已解析: {}", binding.name, binding.scope, binding.resolved);
    }
    Ok(())
}

/// 演示测试替身替换
fn demonstrate_swap(container: &Container) -> anyhow::Result<()> {
    info!("演示替换绑定");

    container.swap(&Binding::<HttpClient>::of(), |_| {
        Ok(HttpClient {
            base_url: "http://localhost:9999/mock".to_string(),
            connection_id: 0,
        })
    })?;

    let handler = container.get(&Binding::<RequestHandler>::of())?;
    info!("替换后请求 {} -> {}", handler.request_id, handler.client.base_url);
    Ok(())
}

/// 演示未绑定错误
fn demonstrate_missing_binding(container: &Container) {
    struct Unregistered;

    if let Err(e) = container.get(&Binding::<Unregistered>::of()) {
        error!("解析失败: {}", e);
    }
}
