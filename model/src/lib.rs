/*!

This library provides the data model of a kube-aws cluster description: the settings groups a
user writes in `cluster.yaml`, the closed sets of values some of those settings accept, and the
baseline every decoded document is overlaid onto.

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use choice::Choice;
pub use cluster::{ClusterConfig, DeploymentSettings, FlannelSettings, KubeClusterSettings};
pub use configuration::Configuration;
pub use error::{Error, Result};
pub use experimental::{
    Admission, AuditLog, Authentication, AwsEnvironment, EphemeralImageStorage, Experimental,
    LoadBalancerAttachment, NodeLabels, Plugins, Taint, TaintEffect, TargetGroupAttachment,
    Toggle, WaitSignal, Webhook,
};
pub use image::{ContainerRuntime, Image, ImageSettings, ReleaseChannel, ReleaseVersion};
pub use node_group::{
    AutoScalingGroup, Controller, ControllerSettings, Etcd, EtcdNodeSettings, EtcdSettings,
    LoadBalancer, Tenancy, VolumeSpec, VolumeType, WorkerSettings,
};
pub use region::Region;
pub use subnet::{NatGateway, NatGatewayConfig, RouteTable, Subnet};

mod choice;
mod cluster;
mod configuration;
pub mod constants;
mod error;
mod experimental;
mod image;
mod node_group;
mod region;
mod subnet;
