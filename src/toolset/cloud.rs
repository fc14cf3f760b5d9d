//! Profiles for the AWS and GCP management servers. The servers themselves
//! are external; only the prompting lives here.

use serde_json::json;

use super::{Example, Toolset};

pub struct Aws;

impl Toolset for Aws {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn intro(&self) -> &'static str {
        "You are an advanced AWS cloud management assistant with access to these AWS tools:"
    }

    fn examples(&self) -> Vec<Example> {
        vec![
            Example::new(
                "List instances in region",
                "list_ec2_instances",
                json!({ "region": "us-east-1" }),
            ),
            Example::new("List ALL instances", "list_all_ec2_instances", json!({})),
            Example::new("Regional summary", "get_ec2_instances_by_region", json!({})),
            Example::new(
                "Start instance",
                "start_ec2_instance",
                json!({ "instance_id": "i-1234567890abcdef0", "region": "us-east-1" }),
            ),
            Example::new("List S3 buckets", "list_s3_buckets", json!({})),
            Example::new(
                "Lambda functions",
                "list_lambda_functions",
                json!({ "region": "us-east-1" }),
            ),
            Example::new("Help", "get_aws_help", json!({})),
        ]
    }

    fn rules(&self) -> &'static str {
        "🌩️ AWS REGIONS & MULTI-REGION SUPPORT:
- Default region is us-east-1 unless specified
- Use \"list_all_ec2_instances\" to see instances across ALL regions
- Use \"get_ec2_instances_by_region\" for regional summary
- Common regions: us-east-1, us-west-2, eu-west-1, ap-southeast-1

🔍 TROUBLESHOOTING MISSING INSTANCES:
If user expects more instances than shown:
1. Check if they want all regions: use \"list_all_ec2_instances\"
2. Check regional distribution: use \"get_ec2_instances_by_region\"
3. Verify the specific region they're asking about

🎯 Always prioritize accuracy and provide clear AWS resource information."
    }

    fn query_label(&self) -> &'static str {
        "🌩️ User query"
    }

    fn repl_prompt(&self) -> &'static str {
        "☁️ AWS Query: "
    }

    fn banner(&self) -> &'static str {
        "🌩️ AWS Cloud Management MCP Client Started!"
    }

    fn tips(&self) -> Vec<&'static str> {
        vec![
            "Type 'help' to see what AWS operations you can perform",
            "Try 'list ec2 instances' or 'show s3 buckets'",
            "Type 'quit' to exit",
        ]
    }

    fn help_tool(&self) -> Option<&'static str> {
        Some("get_aws_help")
    }

    fn help_fallback(&self) -> &'static str {
        "I can help you manage AWS resources! Try asking about EC2 instances, S3 buckets, Lambda functions, or costs."
    }

    fn result_heading(&self) -> &'static str {
        "🌩️ AWS Cloud Information:"
    }

    fn tool_noun(&self) -> &'static str {
        "an AWS tool"
    }

    fn narration_labels(&self) -> (&'static str, &'static str, &'static str) {
        ("🌩️ AWS CLOUD ANALYSIS REQUEST", "AWS Tool Used", "📊 AWS DATA RECEIVED:")
    }

    fn narration_instructions(&self) -> &'static str {
        "Analyze the AWS data and provide a comprehensive, well-formatted response that:
1. Directly answers the user's AWS question
2. Highlights important cloud resource information
3. Uses clear, technical language appropriate for AWS users
4. Formats data in an easy-to-read structure
5. Includes relevant recommendations or next steps if applicable
6. Shows costs, resource IDs, and statuses clearly

Please provide your AWS analysis now:"
    }
}

pub struct Gcp;

impl Toolset for Gcp {
    fn name(&self) -> &'static str {
        "gcp"
    }

    fn intro(&self) -> &'static str {
        "You are an advanced Google Cloud Platform management assistant with access to these GCP tools:"
    }

    fn examples(&self) -> Vec<Example> {
        vec![
            Example::new(
                "List instances",
                "list_compute_instances",
                json!({ "zone": "us-central1-a" }),
            ),
            Example::new(
                "Start instance",
                "start_compute_instance",
                json!({ "instance_name": "my-vm", "zone": "us-central1-a" }),
            ),
            Example::new("List buckets", "list_storage_buckets", json!({})),
            Example::new(
                "Cloud Functions",
                "list_cloud_functions",
                json!({ "location": "us-central1" }),
            ),
            Example::new(
                "Monitoring",
                "get_monitoring_metrics",
                json!({ "metric_type": "compute.googleapis.com/instance/cpu/utilization", "hours": 1 }),
            ),
            Example::new("Help", "get_gcp_help", json!({})),
        ]
    }

    fn rules(&self) -> &'static str {
        "☁️ GCP ZONES & REGIONS:
- Default zone is us-central1-a unless specified
- Common zones: us-central1-a, us-west1-b, europe-west1-b, asia-east1-a
- Common regions: us-central1, us-west1, europe-west1, asia-east1

🎯 Always prioritize accuracy and provide clear GCP resource information."
    }

    fn query_label(&self) -> &'static str {
        "☁️ User query"
    }

    fn repl_prompt(&self) -> &'static str {
        "🌐 GCP Query: "
    }

    fn banner(&self) -> &'static str {
        "☁️ GCP Cloud Management MCP Client Started!"
    }

    fn tips(&self) -> Vec<&'static str> {
        vec![
            "Type 'help' to see what GCP operations you can perform",
            "Try 'list compute instances' or 'show storage buckets'",
            "Type 'quit' to exit",
        ]
    }

    fn help_tool(&self) -> Option<&'static str> {
        Some("get_gcp_help")
    }

    fn help_fallback(&self) -> &'static str {
        "I can help you manage GCP resources! Try asking about Compute instances, Storage buckets, Cloud Functions, or monitoring metrics."
    }

    fn result_heading(&self) -> &'static str {
        "☁️ GCP Cloud Information:"
    }

    fn tool_noun(&self) -> &'static str {
        "a GCP tool"
    }

    fn narration_labels(&self) -> (&'static str, &'static str, &'static str) {
        ("☁️ GCP CLOUD ANALYSIS REQUEST", "GCP Tool Used", "📊 GCP DATA RECEIVED:")
    }

    fn narration_instructions(&self) -> &'static str {
        "Analyze the GCP data and provide a comprehensive, well-formatted response that:
1. Directly answers the user's GCP question
2. Highlights important cloud resource information
3. Uses clear, technical language appropriate for GCP users
4. Formats data in an easy-to-read structure
5. Includes relevant recommendations or next steps if applicable
6. Shows resource IDs, statuses, and configurations clearly

Please provide your GCP analysis now:"
    }
}
