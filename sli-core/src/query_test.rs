#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::errors::SliError;
    use crate::filter::LabelFilter;
    use crate::query::{build_query, QueryContext};
    use crate::time_window::TimeWindow;

    fn carts() -> QueryContext {
        QueryContext::new("sockshop", "dev", "carts")
    }

    fn one_second() -> TimeWindow {
        TimeWindow::parse("1571649084", "1571649085").unwrap()
    }

    fn custom(name: &str, template: &str) -> HashMap<String, String> {
        HashMap::from([(name.to_string(), template.to_string())])
    }

    /// Test: Built-in queries without filters
    ///
    /// Purpose
    /// - Pin the exact query text of every built-in indicator.
    ///
    /// Expected
    /// - Default job matcher `job='carts-sockshop-dev'` and a `[1s]` range.
    #[test]
    fn builtin_queries_without_filters() {
        let ctx = carts();
        let w = one_second();

        assert_eq!(
            build_query("throughput", &ctx, &w).unwrap(),
            "sum(rate(http_requests_total{job='carts-sockshop-dev'}[1s]))"
        );
        assert_eq!(
            build_query("error_rate", &ctx, &w).unwrap(),
            "sum(rate(http_requests_total{job='carts-sockshop-dev',status!~'2..'}[1s]))/sum(rate(http_requests_total{job='carts-sockshop-dev'}[1s]))"
        );
        assert_eq!(
            build_query("request_latency_p95", &ctx, &w).unwrap(),
            "histogram_quantile(0.95,sum(rate(http_response_time_milliseconds_bucket{job='carts-sockshop-dev'}[1s]))by(le))"
        );
        assert_eq!(
            build_query("request_latency_p50", &ctx, &w).unwrap(),
            "histogram_quantile(0.50,sum(rate(http_response_time_milliseconds_bucket{job='carts-sockshop-dev'}[1s]))by(le))"
        );
        assert_eq!(
            build_query("request_latency_p90", &ctx, &w).unwrap(),
            "histogram_quantile(0.90,sum(rate(http_response_time_milliseconds_bucket{job='carts-sockshop-dev'}[1s]))by(le))"
        );
    }

    #[test]
    fn error_rate_with_operator_filter() {
        let ctx = carts().with_filters(vec![LabelFilter::new("handler", "=~'ItemsController'")]);
        let q = build_query("error_rate", &ctx, &one_second()).unwrap();
        assert_eq!(
            q,
            "sum(rate(http_requests_total{job='carts-sockshop-dev',handler=~'ItemsController',status!~'2..'}[1s]))/sum(rate(http_requests_total{job='carts-sockshop-dev',handler=~'ItemsController'}[1s]))"
        );
    }

    /// Test: Filter expression variants
    ///
    /// Expected
    /// - Without `job`, output starts with the default job matcher.
    /// - With `job`, output is only the explicit job matcher, quotes stripped.
    #[test]
    fn filter_expression_rules() {
        let ctx = carts().with_filters(vec![LabelFilter::new("handler", "ItemsController")]);
        assert_eq!(
            ctx.filter_expression(),
            "job='carts-sockshop-dev',handler='ItemsController'"
        );

        let ctx = carts().with_filters(vec![LabelFilter::new("handler", "!='ItemsController'")]);
        assert_eq!(
            ctx.filter_expression(),
            "job='carts-sockshop-dev',handler!='ItemsController'"
        );

        let ctx = carts().with_filters(vec![
            LabelFilter::new("handler", "ItemsController"),
            LabelFilter::new("job", "\"carts-canary\""),
            LabelFilter::new("method", "!=GET"),
        ]);
        assert_eq!(ctx.filter_expression(), "job='carts-canary'");

        assert!(carts()
            .with_filters(vec![LabelFilter::new("instance", "=~.*:8080")])
            .filter_expression()
            .starts_with("job='carts-sockshop-dev'"));
    }

    #[test]
    fn explicit_job_applies_to_builtins() {
        let ctx = carts().with_filters(vec![
            LabelFilter::new("job", "'carts-primary'"),
            LabelFilter::new("handler", "ItemsController"),
        ]);
        assert_eq!(
            build_query("throughput", &ctx, &one_second()).unwrap(),
            "sum(rate(http_requests_total{job='carts-primary'}[1s]))"
        );
    }

    /// Test: Custom template with identity, duration and filter placeholders
    ///
    /// Expected
    /// - `$SERVICE/$PROJECT/$STAGE` resolve to the identity.
    /// - `$DURATION_SECONDS` resolves to `1s`.
    /// - `$handler` resolves to the filter value without quotes.
    #[test]
    fn custom_template_substitution() {
        let template = "sum(rate(my_custom_metric{job='$SERVICE-$PROJECT-$STAGE',handler=~'$handler',status!~'2..'}[$DURATION_SECONDS]))/sum(rate(my_custom_metric{job='$SERVICE-$PROJECT-$STAGE',handler=~'$handler'}[$DURATION_SECONDS]))";
        let ctx = carts()
            .with_filters(vec![LabelFilter::new("handler", "'ItemsController'")])
            .with_custom_queries(custom("checkout_errors", template));

        let q = build_query("checkout_errors", &ctx, &one_second()).unwrap();
        assert_eq!(
            q,
            "sum(rate(my_custom_metric{job='carts-sockshop-dev',handler=~'ItemsController',status!~'2..'}[1s]))/sum(rate(my_custom_metric{job='carts-sockshop-dev',handler=~'ItemsController'}[1s]))"
        );
    }

    #[test]
    fn custom_template_overrides_builtin() {
        let ctx = carts().with_custom_queries(custom(
            "throughput",
            "sum(rate(my_requests{service='$SERVICE'}[$DURATION_SECONDS]))",
        ));
        assert_eq!(
            build_query("throughput", &ctx, &one_second()).unwrap(),
            "sum(rate(my_requests{service='carts'}[1s]))"
        );
    }

    #[test]
    fn custom_template_does_not_merge_filters() {
        let ctx = carts()
            .with_filters(vec![LabelFilter::new("handler", "ItemsController")])
            .with_custom_queries(custom("cpu", "avg(cpu_usage{pod=~'$SERVICE.*'})"));
        assert_eq!(
            build_query("cpu", &ctx, &one_second()).unwrap(),
            "avg(cpu_usage{pod=~'carts.*'})"
        );
    }

    #[test]
    fn longer_filter_keys_substitute_first() {
        let ctx = carts()
            .with_filters(vec![
                LabelFilter::new("handler", "Items"),
                LabelFilter::new("handler_group", "api"),
            ])
            .with_custom_queries(custom("q", "m{h='$handler',g='$handler_group'}"));
        assert_eq!(
            build_query("q", &ctx, &one_second()).unwrap(),
            "m{h='Items',g='api'}"
        );
    }

    #[test]
    fn unknown_indicator_is_unsupported() {
        let err = build_query("request_latency_p99", &carts(), &one_second()).unwrap_err();
        assert!(matches!(err, SliError::UnsupportedIndicator(ref n) if n == "request_latency_p99"));
        assert_eq!(err.to_string(), "unsupported SLI: request_latency_p99");
    }
}
