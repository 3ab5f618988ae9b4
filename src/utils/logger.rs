use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 默认过滤规则，`RUST_LOG` 存在时优先使用
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "invest_planner=debug,llm_trace=info,warn"
    } else {
        "invest_planner=info,llm_trace=info,warn"
    }
}

/// 初始化日志，输出到stderr以免与报告混在一起
pub fn init_logger(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json(), // JSON格式便于远程采集llm_trace事件
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::default_filter;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn test_default_filters_parse() {
        for verbose in [false, true] {
            assert!(EnvFilter::try_new(default_filter(verbose)).is_ok());
        }
        assert!(default_filter(true).contains("invest_planner=debug"));
    }
}
