//! Centralized integration tests for di-impl crate
use di_abstractions::{Binding, ContainerConfig, RebindPolicy, Scope};
use di_impl::{Container, ContainerBuilder};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct AppConfig {
    base_url: String,
    floor_price: u32,
}

#[derive(Debug)]
struct HttpClient {
    base_url: String,
}

#[derive(Debug)]
struct DataSource {
    http_client: Arc<HttpClient>,
}

/// 竞价服务，依赖数据源和配置
#[derive(Debug)]
struct BiddingService {
    data_source: Arc<DataSource>,
    floor_price: u32,
}

fn app_config() -> Binding<AppConfig> {
    Binding::of()
}

fn http_client() -> Binding<HttpClient> {
    Binding::of()
}

fn data_source() -> Binding<DataSource> {
    Binding::of()
}

fn bidding_service() -> Binding<BiddingService> {
    Binding::of()
}

fn build_container() -> Container {
    ContainerBuilder::new()
        .factory(bidding_service(), |c| {
            Ok(BiddingService {
                data_source: c.get(&data_source())?,
                floor_price: c.get(&app_config())?.floor_price,
            })
        })
        .singleton(data_source(), |c| {
            Ok(DataSource {
                http_client: c.get(&http_client())?,
            })
        })
        .singleton(http_client(), |c| {
            Ok(HttpClient {
                base_url: c.get(&app_config())?.base_url.clone(),
            })
        })
        .singleton(app_config(), |_| {
            Ok(AppConfig {
                base_url: "https://bid.example".to_string(),
                floor_price: 12,
            })
        })
        .build()
}

#[test]
fn test_object_graph_resolution() -> anyhow::Result<()> {
    let container = build_container();

    let service = container.get(&bidding_service())?;

    assert_eq!(service.floor_price, 12);
    assert_eq!(service.data_source.http_client.base_url, "https://bid.example");
    Ok(())
}

#[test]
fn test_factory_scoped_service_shares_singleton_dependencies() -> anyhow::Result<()> {
    let container = build_container();

    let first = container.get(&bidding_service())?;
    let second = container.get(&bidding_service())?;

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.data_source, &second.data_source));
    Ok(())
}

#[test]
fn test_swap_dependency_for_testing() -> anyhow::Result<()> {
    let container = build_container();
    let before = container.get(&bidding_service())?;
    assert_eq!(before.data_source.http_client.base_url, "https://bid.example");

    container.swap(&http_client(), |_| {
        Ok(HttpClient {
            base_url: "http://mock".to_string(),
        })
    })?;
    // 数据源已缓存，需要重置才能拿到新的客户端
    container.reset_singleton(&data_source());

    let after = container.get(&bidding_service())?;
    assert_eq!(after.data_source.http_client.base_url, "http://mock");
    assert_eq!(container.scope_of(&http_client()), Some(Scope::Singleton));
    Ok(())
}

#[test]
fn test_missing_dependency_surfaces_not_bound() {
    let container = build_container();
    container.unbind(&app_config());

    let err = container.get(&bidding_service()).unwrap_err();

    assert!(err.is_not_bound());
    assert_eq!(err.binding(), app_config().name());
    assert!(!container.is_resolved(&data_source()));
}

#[test]
fn test_rebind_policy_from_config() -> anyhow::Result<()> {
    let config = ContainerConfig::from_toml_str(r#"rebind_policy = "reset_resolved""#)?;
    assert_eq!(config.rebind_policy, RebindPolicy::ResetResolved);

    let container = Container::with_config(config);
    let client = http_client();

    container.bind_singleton(&client, |_| {
        Ok(HttpClient {
            base_url: "a".to_string(),
        })
    });
    assert_eq!(container.get(&client)?.base_url, "a");

    container.bind_singleton(&client, |_| {
        Ok(HttpClient {
            base_url: "b".to_string(),
        })
    });
    assert_eq!(container.get(&client)?.base_url, "b");
    Ok(())
}

#[test]
fn test_concurrent_resolution_from_shared_container() {
    let container = Arc::new(Container::new());
    let created = Arc::new(AtomicUsize::new(0));

    let counted = created.clone();
    container.bind_singleton(&http_client(), move |_| {
        counted.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(10));
        Ok(HttpClient {
            base_url: "shared".to_string(),
        })
    });

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let container = Arc::clone(&container);
            std::thread::spawn(move || container.get(&http_client()).unwrap())
        })
        .collect();
    let clients: Vec<Arc<HttpClient>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));

    let stats = container.stats();
    assert_eq!(stats.resolutions, 32);
    assert_eq!(stats.factory_invocations, 1);
}

#[test]
fn test_concurrent_factory_scope_invokes_every_time() {
    let container = Arc::new(Container::new());
    let created = Arc::new(AtomicUsize::new(0));

    let counted = created.clone();
    container.bind_factory(&http_client(), move |_| {
        let n = counted.fetch_add(1, Ordering::SeqCst);
        Ok(HttpClient {
            base_url: format!("client-{n}"),
        })
    });

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let container = &container;
            scope.spawn(move || {
                for _ in 0..10 {
                    container.get(&http_client()).unwrap();
                }
            });
        }
    });

    assert_eq!(created.load(Ordering::SeqCst), 80);
    assert_eq!(container.stats().resolved_singletons, 0);
}

/// 竞价轮次，值为安装该工厂时的轮次号
#[derive(Debug)]
struct Round(u64);

/// 后台线程不断解析并重置单例，主线程每次替换绑定后立即解析，
/// 返回所有读到旧工厂结果的 (轮次, 读到的值)
fn resolve_while_replacing(container: &Container, replace: impl Fn(&Container, u64)) -> Vec<(u64, u64)> {
    let round = Binding::<Round>::of();
    let done = AtomicBool::new(false);
    let mut stale = Vec::new();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    container.get(&round).unwrap();
                    container.reset_singleton(&round);
                }
            });
        }

        for g in 1..=2_000 {
            replace(container, g);
            let seen = container.get(&round).map(|r| r.0).unwrap_or(0);
            if seen != g {
                stale.push((g, seen));
            }
        }
        done.store(true, Ordering::Release);
    });

    stale
}

#[test]
fn test_swap_during_concurrent_resolution_uses_new_factory() {
    let container = Container::new();
    container.bind_singleton(&Binding::<Round>::of(), |_| Ok(Round(0)));

    let stale = resolve_while_replacing(&container, |c, g| {
        c.swap(&Binding::<Round>::of(), move |_| Ok(Round(g))).unwrap();
    });

    assert!(stale.is_empty(), "stale reads after swap: {:?}", &stale[..stale.len().min(5)]);
    assert_eq!(container.scope_of(&Binding::<Round>::of()), Some(Scope::Singleton));
}

#[test]
fn test_rebind_during_concurrent_resolution_honors_new_scope() {
    let config = ContainerConfig::default().with_rebind_policy(RebindPolicy::ResetResolved);
    let container = Container::with_config(config);
    container.bind_singleton(&Binding::<Round>::of(), |_| Ok(Round(0)));

    // 交替单例和工厂作用域，工厂作用域下不能返回任何缓存值
    let stale = resolve_while_replacing(&container, |c, g| {
        let scope = if g % 2 == 0 { Scope::Singleton } else { Scope::Factory };
        c.bind(&Binding::<Round>::of(), move |_| Ok(Round(g)), scope);
    });

    assert!(stale.is_empty(), "stale reads after rebind: {:?}", &stale[..stale.len().min(5)]);
}

#[test]
fn test_unbind_and_rebind_during_concurrent_resolution() {
    let container = Container::new();
    let round = Binding::<Round>::of();
    container.bind_singleton(&round, |_| Ok(Round(0)));
    let done = AtomicBool::new(false);
    let mut stale = Vec::new();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    // 解绑窗口内允许 NotBound，其他错误都不应出现
                    if let Err(err) = container.get(&round) {
                        assert!(err.is_not_bound(), "unexpected error: {err}");
                    }
                }
            });
        }

        for g in 1..=2_000 {
            container.unbind(&round);
            container.bind_singleton(&round, move |_| Ok(Round(g)));
            let seen = container.get(&round).map(|r| r.0).unwrap_or(0);
            if seen != g {
                stale.push((g, seen));
            }
        }
        done.store(true, Ordering::Release);
    });

    assert!(stale.is_empty(), "stale reads after rebind: {:?}", &stale[..stale.len().min(5)]);
    assert!(container.is_resolved(&round));
}
