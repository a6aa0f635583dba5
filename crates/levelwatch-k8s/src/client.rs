//! Kubernetes client for levelwatch

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use kube::api::LogParams;
use kube::config::KubeConfigOptions;

use crate::stream::{self, LogLines};
use levelwatch_types::{ContainerInfo, PodInfo, PodStatus};

/// Parameters for the pod log request
#[derive(Clone, Debug)]
pub struct TailOptions {
    /// Keep the stream open and wait for new lines
    pub follow: bool,

    /// Number of historical lines to start from (`None` = whole log)
    pub tail_lines: Option<i64>,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            follow: true,
            tail_lines: Some(100),
        }
    }
}

/// Kubernetes client wrapper
pub struct KubeClient {
    client: kube::Client,
}

impl KubeClient {
    /// Connect using the named kubeconfig context, or infer the configuration
    ///
    /// Inference reads `$KUBECONFIG` / `~/.kube/config` and falls back to the
    /// in-cluster service account.
    pub async fn connect(context: Option<&str>) -> Result<Self> {
        let config = match context {
            Some(name) => kube::Config::from_kubeconfig(&KubeConfigOptions {
                context: Some(name.to_string()),
                ..Default::default()
            })
            .await
            .context(format!("Failed to create config for context: {}", name))?,
            None => kube::Config::infer()
                .await
                .context("Failed to load kubeconfig or in-cluster config. Is kubectl configured?")?,
        };

        tracing::info!(cluster = %config.cluster_url, "connecting to cluster");

        let client =
            kube::Client::try_from(config).context("Failed to create Kubernetes client")?;

        Ok(Self { client })
    }

    /// Fetch a single pod by name
    pub async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodInfo> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = pods.get(name).await.context(format!(
            "Failed to get pod '{}' in namespace '{}'",
            name, namespace
        ))?;

        Ok(Self::pod_to_info(pod, namespace))
    }

    /// Convert a k8s Pod to PodInfo
    fn pod_to_info(pod: Pod, namespace: &str) -> PodInfo {
        let name = pod.metadata.name.unwrap_or_default();
        let mut info = PodInfo::new(name, namespace.to_string());

        if let Some(spec) = pod.spec {
            info.node_name = spec.node_name;
            info.containers = spec
                .containers
                .into_iter()
                .map(|c| ContainerInfo::new(c.name))
                .collect();
        }

        if let Some(status) = pod.status {
            info.status = status
                .phase
                .as_deref()
                .map(PodStatus::from)
                .unwrap_or(PodStatus::Unknown);
        }

        info
    }

    /// Open the log stream of one container
    pub async fn log_lines(
        &self,
        pod: &PodInfo,
        container: &str,
        options: &TailOptions,
    ) -> Result<LogLines> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &pod.namespace);

        // Server-side timestamps stay off: they would prepend a token to every line
        let params = LogParams {
            follow: options.follow,
            container: Some(container.to_string()),
            tail_lines: options.tail_lines,
            timestamps: false,
            ..Default::default()
        };

        tracing::info!(
            pod = %pod.name,
            namespace = %pod.namespace,
            container,
            follow = options.follow,
            tail_lines = ?options.tail_lines,
            "opening log stream"
        );

        stream::open(api, pod.name.clone(), params)
            .await
            .context(format!(
                "Failed to open log stream for {}/{} (container {})",
                pod.namespace, pod.name, container
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Container, PodSpec, PodStatus as K8sPodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[test]
    fn test_pod_to_info() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("logging-mock-service-pod".to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                node_name: Some("node-3".to_string()),
                containers: vec![
                    Container {
                        name: "logging-mock-service".to_string(),
                        ..Default::default()
                    },
                    Container {
                        name: "istio-proxy".to_string(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }),
            status: Some(K8sPodStatus {
                phase: Some("Running".to_string()),
                ..Default::default()
            }),
        };

        let info = KubeClient::pod_to_info(pod, "default");
        assert_eq!(info.name, "logging-mock-service-pod");
        assert_eq!(info.namespace, "default");
        assert_eq!(info.status, PodStatus::Running);
        assert_eq!(info.node_name.as_deref(), Some("node-3"));
        assert_eq!(
            info.resolve_container(None).map(|c| c.name.as_str()),
            Some("logging-mock-service")
        );
    }

    #[test]
    fn test_pod_without_status() {
        let info = KubeClient::pod_to_info(Pod::default(), "default");
        assert_eq!(info.status, PodStatus::Unknown);
        assert!(info.containers.is_empty());
    }

    #[test]
    fn test_default_tail_options() {
        let options = TailOptions::default();
        assert!(options.follow);
        assert_eq!(options.tail_lines, Some(100));
    }
}
